pub mod codec;
pub mod model;
pub mod tbx;

pub use codec::{export_glossary, import_glossary};
pub use model::{Glossary, GlossaryEntry, LanguageSection, TermSection};
pub use tbx::{ensure_tbx, read_tbx, write_tbx};
