//! Tool handlers end to end against the in-memory spreadsheet service.

mod support;

use anyhow::Result;
use assert_matches::assert_matches;
use base64::Engine;
use google_sheets_mcp::ConnectorError;
use google_sheets_mcp::client::memory::InMemoryBackend;
use google_sheets_mcp::client::{
    DriveFile, MIME_GOOGLE_FOLDER, MIME_GOOGLE_SHEET, MIME_GOOGLE_SHORTCUT, MIME_XLSX,
    ShortcutDetails,
};
use google_sheets_mcp::csv_io::CsvOptions;
use google_sheets_mcp::tools::{self, *};
use support::{TestWorkspace, grid, strings};

fn connector_error(error: &anyhow::Error) -> &ConnectorError {
    error
        .downcast_ref::<ConnectorError>()
        .expect("tool errors carry a ConnectorError")
}

fn drive_file(id: &str, name: &str, mime_type: &str) -> DriveFile {
    DriveFile {
        id: id.to_string(),
        name: name.to_string(),
        mime_type: mime_type.to_string(),
        parents: vec!["root".to_string()],
        web_view_link: None,
        trashed: false,
        shortcut_details: None,
    }
}

fn shortcut(id: &str, target_id: &str, target_mime: &str) -> DriveFile {
    DriveFile {
        shortcut_details: Some(ShortcutDetails {
            target_id: target_id.to_string(),
            target_mime_type: Some(target_mime.to_string()),
        }),
        ..drive_file(id, "shortcut", MIME_GOOGLE_SHORTCUT)
    }
}

// =============================================================================
// CELLS, ROWS AND COLUMNS
// =============================================================================

#[tokio::test(flavor = "current_thread")]
async fn cell_read_and_write() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with("Data", 100, &[&["name", "qty"], &["pen", "4"]]);

    let cell = tools::get_cell(
        workspace.state(),
        serde_json::from_value(serde_json::json!({
            "spreadsheet_id": id,
            "sheet_name": "Data",
            "column": "b",
            "row": 2,
        }))?,
    )
    .await?;
    assert_eq!(cell.address, "B2");
    assert_eq!(cell.value, "4");

    let empty = tools::get_cell(
        workspace.state(),
        GetCellParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            column: "Z".into(),
            row: "40".into(),
        },
    )
    .await?;
    assert_eq!(empty.value, "");

    let written = tools::update_cell(
        workspace.state(),
        UpdateCellParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            column: "C".into(),
            row: "150".into(),
            value: "late".into(),
        },
    )
    .await?;
    assert_eq!(written.address, "C150");
    assert_eq!(written.value, "late");
    assert!(workspace.backend.calls().iter().any(|call| call == "append_rows 0 50"));
    assert_eq!(workspace.values(&id, "Data")[149][2], "late");
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn row_text_must_be_a_positive_number() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with("Data", 100, &[]);

    for row in ["0", "-3", "abc"] {
        let error = tools::get_cell(
            workspace.state(),
            GetCellParams {
                spreadsheet_id: id.clone(),
                sheet_name: "Data".into(),
                column: "A".into(),
                row: row.into(),
            },
        )
        .await
        .unwrap_err();
        assert_matches!(connector_error(&error), ConnectorError::InvalidRow(_));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn blank_identifiers_are_misconfiguration() -> Result<()> {
    let workspace = TestWorkspace::new();
    let error = tools::get_used_range(
        workspace.state(),
        GetUsedRangeParams {
            spreadsheet_id: "  ".into(),
            sheet_name: "Data".into(),
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&error), ConnectorError::Misconfiguration(_));
    assert!(workspace.backend.calls().is_empty());
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn rows_are_added_below_used_range() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with("Data", 3, &[&["id", "item"], &["1", "pen"], &["2", "ink"]]);

    let added = tools::add_row(
        workspace.state(),
        AddRowParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            values: strings(&["3", "pad"]),
            column: None,
        },
    )
    .await?;
    assert_eq!(added.row_id, 4);
    assert_eq!(added.values, vec!["3", "pad"]);

    let row = tools::get_row(
        workspace.state(),
        GetRowParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            row: "4".into(),
            start_column: "A".into(),
            end_column: "C".into(),
        },
    )
    .await?;
    assert_eq!(row.values, vec!["3", "pad"]);

    let blank = tools::add_row(
        workspace.state(),
        AddRowParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            values: strings(&["", " "]),
            column: None,
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&blank), ConnectorError::Misconfiguration(_));

    let empty = tools::add_row(
        workspace.state(),
        AddRowParams {
            spreadsheet_id: id,
            sheet_name: "Data".into(),
            values: Vec::new(),
            column: None,
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&empty), ConnectorError::Misconfiguration(_));
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn row_and_column_updates() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with("Data", 5, &[]);

    let row = tools::update_row(
        workspace.state(),
        UpdateRowParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            cell_address: "B2".into(),
            values: strings(&["x", "y", "z"]),
        },
    )
    .await?;
    assert_eq!(row.row_id, 2);

    let column = tools::update_column(
        workspace.state(),
        UpdateColumnParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            cell_address: "A4".into(),
            values: strings(&["a", "b", "c", "d"]),
        },
    )
    .await?;
    assert_eq!(column.column, "A");
    assert_eq!(column.values, vec!["a", "b", "c", "d"]);

    let values = workspace.values(&id, "Data");
    assert_eq!(values[1], vec!["", "x", "y", "z"]);
    assert_eq!(values[6][0], "d");

    let read = tools::get_column(
        workspace.state(),
        GetColumnParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            column: "A".into(),
            start_row: "4".into(),
            end_row: "7".into(),
        },
    )
    .await?;
    assert_eq!(read.values, vec!["a", "b", "c", "d"]);

    let empty = tools::update_column(
        workspace.state(),
        UpdateColumnParams {
            spreadsheet_id: id,
            sheet_name: "Data".into(),
            cell_address: "A1".into(),
            values: Vec::new(),
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&empty), ConnectorError::Misconfiguration(_));
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn find_row_and_column_match_exactly() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with(
        "Data",
        100,
        &[&["id", "name", "email"], &["1", "Ann", "ann@x"], &["2", "Bob", "bob@x"]],
    );

    let found = tools::find_row(
        workspace.state(),
        FindRowParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            column: "B".into(),
            value: "Bob".into(),
        },
    )
    .await?;
    assert_eq!(found.row, Some(3));

    let missing = tools::find_row(
        workspace.state(),
        FindRowParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            column: "B".into(),
            value: "bob".into(),
        },
    )
    .await?;
    assert_eq!(missing.row, None);

    let column = tools::find_column(
        workspace.state(),
        FindColumnParams {
            spreadsheet_id: id,
            sheet_name: "Data".into(),
            row: "1".into(),
            value: "email".into(),
        },
    )
    .await?;
    assert_eq!(column.column.as_deref(), Some("C"));
    Ok(())
}

// =============================================================================
// RANGES
// =============================================================================

#[tokio::test(flavor = "current_thread")]
async fn ranges_are_numbered_from_their_first_row() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with(
        "Data",
        100,
        &[&["a1", "b1", "c1"], &["a2", "b2", "c2"], &["a3", "b3", "c3"]],
    );

    let range = tools::get_range(
        workspace.state(),
        GetRangeParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            start_cell: "B2".into(),
            end_cell: "C3".into(),
        },
    )
    .await?;
    assert_eq!(range.rows_count, 2);
    assert_eq!(range.rows[0].row_id, 2);
    assert_eq!(range.rows[1].values, vec!["b3", "c3"]);

    let used = tools::get_used_range(
        workspace.state(),
        GetUsedRangeParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
        },
    )
    .await?;
    let ids: Vec<u32> = used.rows.iter().map(|row| row.row_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let cleared = tools::clear_range(
        workspace.state(),
        ClearRangeParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            range: "A3:C3".into(),
        },
    )
    .await?;
    assert_eq!(cleared.cleared_range, "Data!A3:C3");
    assert_eq!(workspace.values(&id, "Data").len(), 2);

    let bad = tools::clear_range(
        workspace.state(),
        ClearRangeParams {
            spreadsheet_id: id,
            sheet_name: "Data".into(),
            range: "A1:?".into(),
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&bad), ConnectorError::InvalidAddress(_));
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn reversed_corners_read_the_same_block() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with("Data", 100, &[&["a1", "b1"], &["a2", "b2"], &["a3", "b3"]]);

    let range = tools::get_range(
        workspace.state(),
        GetRangeParams {
            spreadsheet_id: id,
            sheet_name: "Data".into(),
            start_cell: "B3".into(),
            end_cell: "A1".into(),
        },
    )
    .await?;
    assert_eq!(range.rows_count, 3);
    let ids: Vec<u32> = range.rows.iter().map(|row| row.row_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(range.rows[0].values, vec!["a1", "b1"]);
    assert_eq!(range.rows[2].values, vec!["a3", "b3"]);
    Ok(())
}

// =============================================================================
// SHEETS AND SPREADSHEETS
// =============================================================================

#[tokio::test(flavor = "current_thread")]
async fn sheet_lifecycle() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with("Summary", 100, &[]);

    let created = tools::create_sheet(
        workspace.state(),
        CreateSheetParams {
            spreadsheet_id: id.clone(),
            title: "Raw data".into(),
        },
    )
    .await?;
    assert_eq!(created.title, "Raw data");
    assert_eq!(created.index, 1);

    let listed = tools::list_sheets(
        workspace.state(),
        ListSheetsParams {
            spreadsheet_id: id.clone(),
            search: Some("RAW".into()),
        },
    )
    .await?;
    let titles: Vec<&str> = listed.sheets.iter().map(|sheet| sheet.title.as_str()).collect();
    assert_eq!(titles, vec!["Raw data"]);

    let deleted = tools::delete_sheet(
        workspace.state(),
        DeleteSheetParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Summary".into(),
        },
    )
    .await?;
    assert_eq!(deleted.deleted_sheet.title, "Summary");
    assert_eq!(deleted.remaining_sheets, 1);

    let last = tools::delete_sheet(
        workspace.state(),
        DeleteSheetParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Raw data".into(),
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&last), ConnectorError::Application(_));

    let absent = tools::delete_sheet(
        workspace.state(),
        DeleteSheetParams {
            spreadsheet_id: id,
            sheet_name: "Nope".into(),
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&absent), ConnectorError::SheetNotFound { .. });
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn spreadsheet_is_created_in_folder() -> Result<()> {
    let workspace = TestWorkspace::new();

    let created = tools::create_spreadsheet(
        workspace.state(),
        CreateSpreadsheetParams {
            title: "Budget".into(),
            initial_sheet_name: Some("Q1".into()),
            folder_id: Some("folder-9".into()),
        },
    )
    .await?;
    assert_eq!(created.title, "Budget");
    assert_eq!(
        workspace.backend.file(&created.id).map(|file| file.parents),
        Some(vec!["folder-9".to_string()])
    );
    assert!(workspace.values(&created.id, "Q1").is_empty());

    let untitled = tools::create_spreadsheet(
        workspace.state(),
        CreateSpreadsheetParams {
            title: "   ".into(),
            initial_sheet_name: None,
            folder_id: None,
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&untitled), ConnectorError::Misconfiguration(_));
    Ok(())
}

// =============================================================================
// DRIVE FILES
// =============================================================================

#[tokio::test(flavor = "current_thread")]
async fn search_resolves_shortcuts_and_pages() -> Result<()> {
    let workspace = TestWorkspace::with_backend(InMemoryBackend::with_page_size(2));
    let budget = workspace.backend.seed_spreadsheet("Budget", &[("Sheet1", 10)]);
    let forecast = workspace.backend.seed_spreadsheet("Forecast", &[("Sheet1", 10)]);
    workspace.backend.add_file(drive_file("x1", "Upload.xlsx", MIME_XLSX), Some(b"PK".to_vec()));
    workspace.backend.add_file(shortcut("s1", &budget, MIME_GOOGLE_SHEET), None);
    workspace.backend.add_file(shortcut("s2", "folder-1", MIME_GOOGLE_FOLDER), None);
    workspace.backend.add_file(
        DriveFile {
            trashed: true,
            ..drive_file("t1", "Old", MIME_XLSX)
        },
        None,
    );

    let found = tools::search_spreadsheets(workspace.state(), SearchSpreadsheetsParams::default()).await?;
    let ids: Vec<&str> = found.spreadsheets.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec![budget.as_str(), forecast.as_str(), "x1"]);

    let trashed = tools::search_spreadsheets(
        workspace.state(),
        SearchSpreadsheetsParams {
            folder_id: None,
            include_trashed: Some(true),
        },
    )
    .await?;
    let ids: Vec<&str> = trashed.spreadsheets.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["t1"]);
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn move_file_replaces_parent() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with("Sheet1", 10, &[]);

    let moved = tools::move_file(
        workspace.state(),
        MoveFileParams {
            file_id: id,
            new_parent_folder_id: "archive".into(),
        },
    )
    .await?;
    assert_eq!(moved.parents, vec!["archive"]);
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn spreadsheet_downloads() -> Result<()> {
    let workspace = TestWorkspace::new();
    let native = workspace.backend.seed_spreadsheet("Budget", &[("Sheet1", 10)]);
    workspace.backend.add_file(drive_file("x1", "Upload", MIME_XLSX), Some(b"PK\x03\x04data".to_vec()));
    workspace.backend.add_file(shortcut("s1", &native, MIME_GOOGLE_SHEET), None);

    let pdf = tools::download_spreadsheet(
        workspace.state(),
        DownloadSpreadsheetParams {
            spreadsheet_id: "s1".into(),
            format: "pdf".into(),
        },
    )
    .await?;
    assert_eq!(pdf.file_name, "Budget.pdf");
    let bytes = base64::engine::general_purpose::STANDARD.decode(&pdf.content_base64)?;
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(pdf.size_bytes, bytes.len());

    let xlsx = tools::download_spreadsheet(
        workspace.state(),
        DownloadSpreadsheetParams {
            spreadsheet_id: "x1".into(),
            format: "XLSX".into(),
        },
    )
    .await?;
    assert_eq!(
        base64::engine::general_purpose::STANDARD.decode(&xlsx.content_base64)?,
        b"PK\x03\x04data"
    );

    let xlsx_to_pdf = tools::download_spreadsheet(
        workspace.state(),
        DownloadSpreadsheetParams {
            spreadsheet_id: "x1".into(),
            format: "PDF".into(),
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&xlsx_to_pdf), ConnectorError::Misconfiguration(_));

    let bad_format = tools::download_spreadsheet(
        workspace.state(),
        DownloadSpreadsheetParams {
            spreadsheet_id: native,
            format: "ods".into(),
        },
    )
    .await
    .unwrap_err();
    assert_matches!(
        connector_error(&bad_format),
        ConnectorError::Misconfiguration(message) if message == "File format must be PDF or XLSX"
    );
    Ok(())
}

// =============================================================================
// CSV
// =============================================================================

#[tokio::test(flavor = "current_thread")]
async fn csv_import_appends_and_download_renders() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with("Data", 3, &[&["name", "qty"], &["pen", "4"]]);

    let imported = tools::import_csv(
        workspace.state(),
        ImportCsvParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            csv: "ink,2\n\npad,\"1,5\"\n".into(),
            options: CsvOptions::default(),
            top_left_cell: None,
        },
    )
    .await?;
    assert_eq!(imported.range, "Data!A3:B4");
    assert_eq!(imported.rows_written, 2);
    assert_eq!(imported.columns_written, 2);
    assert_eq!(
        workspace.values(&id, "Data"),
        grid(&[&["name", "qty"], &["pen", "4"], &["ink", "2"], &["pad", "1,5"]])
    );

    let downloaded = tools::download_csv(
        workspace.state(),
        DownloadCsvParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            start_cell: Some("A3".into()),
            end_cell: Some("B4".into()),
            options: CsvOptions {
                newline: Some("\n".into()),
                ..CsvOptions::default()
            },
        },
    )
    .await?;
    assert_eq!(downloaded.file_name, "Data.csv");
    assert_eq!(downloaded.rows, 2);
    assert_eq!(downloaded.csv, "ink,2\npad,\"1,5\"");

    let empty = tools::import_csv(
        workspace.state(),
        ImportCsvParams {
            spreadsheet_id: id,
            sheet_name: "Data".into(),
            csv: "\n\n".into(),
            options: CsvOptions::default(),
            top_left_cell: None,
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&empty), ConnectorError::EmptyData(_));
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn csv_import_at_explicit_cell_pads_rows() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with("Data", 100, &[]);

    let imported = tools::import_csv(
        workspace.state(),
        ImportCsvParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            csv: "a;b;c\nd".into(),
            options: CsvOptions {
                delimiter: Some(";".into()),
                ..CsvOptions::default()
            },
            top_left_cell: Some("C5".into()),
        },
    )
    .await?;
    assert_eq!(imported.range, "Data!C5:E6");

    let downloaded = tools::download_csv(
        workspace.state(),
        DownloadCsvParams {
            spreadsheet_id: id,
            sheet_name: "Data".into(),
            start_cell: None,
            end_cell: None,
            options: CsvOptions::default(),
        },
    )
    .await?;
    assert_eq!(downloaded.rows, 6);
    assert_eq!(downloaded.columns, 5);
    assert!(downloaded.csv.ends_with(",,d,,"));
    Ok(())
}

// =============================================================================
// XLSX
// =============================================================================

fn xlsx_base64(cells: &[(&str, &str)]) -> String {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
    for (address, value) in cells {
        sheet.get_cell_mut(*address).set_value(*value);
    }
    book.new_sheet("Ignored").unwrap().get_cell_mut("A1").set_value("skip");

    let mut buffer = std::io::Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buffer).unwrap();
    base64::engine::general_purpose::STANDARD.encode(buffer.into_inner())
}

#[tokio::test(flavor = "current_thread")]
async fn xlsx_first_sheet_is_pasted_at_the_given_cell() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with("Data", 2, &[&["x"]]);

    let pasted = tools::paste_from_xlsx(
        workspace.state(),
        PasteFromXlsxParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            xlsx_base64: xlsx_base64(&[("A1", "item"), ("B1", "qty"), ("A2", "ink"), ("B2", "2")]),
            top_left_cell: Some("C2".into()),
        },
    )
    .await?;
    assert_eq!(pasted.source_sheet, "Sheet1");
    assert_eq!(pasted.range, "Data!C2:D3");
    assert_eq!(pasted.rows_written, 2);
    assert_eq!(pasted.columns_written, 2);
    assert_eq!(
        workspace.values(&id, "Data"),
        grid(&[&["x"], &["", "", "item", "qty"], &["", "", "ink", "2"]])
    );
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn xlsx_paste_defaults_to_a1_and_checks_inputs() -> Result<()> {
    let workspace = TestWorkspace::new();
    let id = workspace.spreadsheet_with("Data", 100, &[&["old", "row"]]);
    let xlsx = xlsx_base64(&[("A1", "new")]);

    let pasted = tools::paste_from_xlsx(
        workspace.state(),
        PasteFromXlsxParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Data".into(),
            xlsx_base64: xlsx.clone(),
            top_left_cell: None,
        },
    )
    .await?;
    assert_eq!(pasted.range, "Data!A1");
    assert_eq!(workspace.values(&id, "Data"), grid(&[&["new", "row"]]));

    let missing = tools::paste_from_xlsx(
        workspace.state(),
        PasteFromXlsxParams {
            spreadsheet_id: id.clone(),
            sheet_name: "Nope".into(),
            xlsx_base64: xlsx,
            top_left_cell: None,
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&missing), ConnectorError::SheetNotFound { .. });

    let not_base64 = tools::paste_from_xlsx(
        workspace.state(),
        PasteFromXlsxParams {
            spreadsheet_id: id,
            sheet_name: "Data".into(),
            xlsx_base64: "not base64!".into(),
            top_left_cell: None,
        },
    )
    .await
    .unwrap_err();
    assert_matches!(connector_error(&not_base64), ConnectorError::Misconfiguration(_));
    Ok(())
}
