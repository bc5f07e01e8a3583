use chrono::{Datelike, NaiveDate};
use clap::Parser;
use image::{Rgb, RgbImage};
use mesh_processor::analyzers::monthly_means;
use mesh_processor::cli::commands::{describe_dataset, init_logging};
use mesh_processor::cli::{Cli, Commands};
use mesh_processor::models::{ClimateVariable, GridSquareId};
use mesh_processor::processors::BatchStatisticsRunner;
use mesh_processor::readers::{encode_value, split_components, DatasetContext, ValueEncoding};
use mesh_processor::settings::Settings;
use mesh_processor::utils::{PERIOD_END, PERIOD_START};
use mesh_processor::writers::TsvWriter;
use mesh_processor::{ProcessingError, Result};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const LEGEND: &str = r##"[["#ff0000", 1], ["#00ff00", 2], ["#0000ff", 3]]"##;

// Full-period series: every day present, value derived from the date
fn write_series(path: &Path, value: impl Fn(NaiveDate) -> f64) -> Result<()> {
    let mut text = String::from("date,value\n");
    for date in PERIOD_START.iter_days().take_while(|d| *d <= PERIOD_END) {
        text.push_str(&format!("{},{}\n", date.format("%Y-%m-%d"), value(date)));
    }
    fs::write(path, text)?;
    Ok(())
}

fn write_data_png(path: &Path, rows: &[&[Option<f64>]]) -> Result<()> {
    let encoding = ValueEncoding::default();
    let mut image = RgbImage::new(rows[0].len() as u32, rows.len() as u32);
    for (y, row) in rows.iter().enumerate() {
        for (x, value) in row.iter().enumerate() {
            let packed = match value {
                Some(v) => encode_value(*v, &encoding).expect("value fits 24 bits"),
                None => 0x80_00_00,
            };
            let c = split_components(packed, 3);
            image.put_pixel(x as u32, y as u32, Rgb([c[0], c[1], c[2]]));
        }
    }
    image.save(path)?;
    Ok(())
}

fn write_grid_square(base: &Path, id: &str, with_precipitation: bool) -> Result<()> {
    let dir = base.join(id);
    fs::create_dir_all(&dir)?;

    fs::write(
        dir.join("bbox.json"),
        r#"{"minx": 138.25, "miny": 36.6, "maxx": 138.2625, "maxy": 36.608333}"#,
    )?;
    for variable in ClimateVariable::ALL {
        if variable == ClimateVariable::Precipitation && !with_precipitation {
            continue;
        }
        write_series(&dir.join(variable.file_name()), |date| date.month() as f64)?;
    }
    fs::write(dir.join("landuse.csv"), "category,area\n森林,7500\n田,2500\n")?;

    write_data_png(
        &dir.join("dem.png"),
        &[&[Some(812.34), Some(812.99)], &[Some(-3.5), None]],
    )?;
    write_data_png(&dir.join("slope.png"), &[&[Some(10.0), Some(20.0)]])?;
    write_data_png(&dir.join("direction.png"), &[&[Some(350.0), Some(10.0)]])?;

    let mut geology = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
    geology.put_pixel(1, 1, Rgb([0, 255, 0]));
    geology.put_pixel(0, 1, Rgb([9, 9, 9]));
    geology.save(dir.join("geology.png"))?;
    Ok(())
}

fn fixture() -> Result<TempDir> {
    let base = TempDir::new()?;
    fs::write(base.path().join("geology_hex.json"), LEGEND)?;
    write_grid_square(base.path(), "54382130", false)?;
    write_grid_square(base.path(), "54382129", true)?;
    Ok(base)
}

#[test]
fn test_stats_report_end_to_end() -> Result<()> {
    let base = fixture()?;
    let output = TempDir::new()?;

    let context = DatasetContext::open(base.path(), Settings::default())?;
    let report = BatchStatisticsRunner::new(2)
        .with_progress(false)
        .run(&context)?;

    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.geology_codes, vec![1, 2, 3]);
    assert_eq!(report.failure_count(), 1);

    let writer = TsvWriter::new();
    let report_path = output.path().join("mesh_stats.tsv");
    writer.write_report(&report, &report_path)?;

    let text = fs::read_to_string(&report_path)?;
    let lines: Vec<Vec<&str>> = text.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(lines.len(), 3);

    let header = &lines[0];
    let column = |name: &str| header.iter().position(|h| *h == name).unwrap();
    let complete = &lines[1];
    let missing_precipitation = &lines[2];

    assert_eq!(complete[column("mesh_code")], "54382129");
    assert_eq!(missing_precipitation[column("mesh_code")], "54382130");

    // Precipitation is the month number every day, so January totals 31
    assert_eq!(complete[column("prec_month01")], "31");
    assert!(complete[column("prec_month02")].parse::<f64>().unwrap() > 56.0);
    assert_eq!(complete[column("temp_month07")], "7");
    assert_eq!(complete[column("temp_mod")], "1");

    assert_eq!(missing_precipitation[column("prec_mean")], "NA");
    assert_eq!(missing_precipitation[column("prec_month01")], "NA");
    assert_eq!(missing_precipitation[column("temp_month07")], "7");

    for row in [complete, missing_precipitation] {
        // 812.34 and 812.99 both truncate to 812
        assert_eq!(row[column("ele_mod")], "812");
        assert_eq!(row[column("ele_med")], "812");
        assert_eq!(row[column("slp_mean")], "15");
        assert_eq!(row[column("geol_1")], "2");
        assert_eq!(row[column("geol_2")], "1");
        assert_eq!(row[column("geol_3")], "0");
        let direction: f64 = row[column("dir_mean")].parse().unwrap();
        assert!(direction < 1e-6 || 360.0 - direction < 1e-6);
    }

    let summary_path = output.path().join("geology_summary.tsv");
    writer.write_category_summary(&report, &summary_path)?;
    assert_eq!(
        fs::read_to_string(&summary_path)?,
        "code\tpixels\tgrid_squares\n1\t4\t2\n2\t2\t2\n"
    );
    Ok(())
}

#[test]
fn test_data_png_round_trip_through_dataset() -> Result<()> {
    let base = fixture()?;
    let context = DatasetContext::open(base.path(), Settings::default())?;
    let dataset = context.dataset(&GridSquareId::new("54382129"));

    let elevation = dataset.elevation()?;
    let expected = [[Some(812.34), Some(812.99)], [Some(-3.5), None]];
    for (row, values) in expected.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            match (elevation.get(row, col), value) {
                (Some(decoded), Some(original)) => assert!((decoded - original).abs() <= 0.01),
                (decoded, original) => assert_eq!(decoded, *original),
            }
        }
    }

    let geology = dataset.geology()?;
    assert_eq!(
        geology.to_rows(),
        vec![vec![Some(1), Some(1)], vec![None, Some(2)]]
    );
    Ok(())
}

#[test]
fn test_monthly_means_from_single_day_file() -> Result<()> {
    let base = TempDir::new()?;
    let dir = base.path().join("54382129");
    fs::create_dir_all(&dir)?;
    fs::write(dir.join("precipitation.csv"), "date,value\n1978-01-01,5.0\n")?;

    let context = DatasetContext::open(base.path(), Settings::default())?;
    let series = context
        .dataset(&GridSquareId::new("54382129"))
        .precipitation()?;
    let months = monthly_means(&series);

    assert_eq!(months.len(), 468);
    assert_eq!(months[0].value, Some(5.0));
    assert_eq!(months.iter().filter(|m| m.value.is_none()).count(), 467);
    Ok(())
}

#[test]
fn test_inspect_reports_every_accessor() -> Result<()> {
    let base = fixture()?;
    let context = DatasetContext::open(base.path(), Settings::default())?;
    let dataset = context.dataset(&GridSquareId::new("54382130"));

    let lines = describe_dataset(&dataset);
    assert_eq!(lines.len(), 12);
    assert!(lines[0].starts_with("bbox"));
    assert!(lines[1].contains("No precipitation data for grid square 54382130"));
    assert!(lines[2].contains("14245 of 14245 days valid"));
    assert!(lines[7].contains("dominant forest"));
    assert!(lines[11].contains("codes 1:2 2:1"));
    Ok(())
}

#[test]
fn test_unknown_grid_square_is_not_found() -> Result<()> {
    let base = fixture()?;
    let context = DatasetContext::open(base.path(), Settings::default())?;
    let dataset = context.dataset(&GridSquareId::new("99999999"));

    assert!(matches!(
        dataset.bounding_box(),
        Err(ProcessingError::DatasetNotFound { .. })
    ));
    Ok(())
}

// Only test in this binary that installs the global subscriber
#[test]
fn test_log_file_receives_events() -> Result<()> {
    let dir = TempDir::new()?;
    let log_path = dir.path().join("mesh.log");

    init_logging(true, Some(&log_path))?;
    tracing::info!("summarizing grid square 54382129");
    tracing::debug!("debug events pass at verbose level");

    let text = fs::read_to_string(&log_path)?;
    assert!(text.contains("summarizing grid square 54382129"));
    assert!(text.contains("debug events pass at verbose level"));
    assert!(!text.contains('\u{1b}'));

    // A second subscriber cannot be installed
    assert!(matches!(
        init_logging(false, None),
        Err(ProcessingError::Config(_))
    ));
    Ok(())
}

#[test]
fn test_cli_parsing() {
    let cli = Cli::try_parse_from([
        "mesh-processor",
        "--verbose",
        "stats",
        "-i",
        "meshes",
        "-o",
        "results",
        "--max-workers",
        "3",
        "--quiet",
    ])
    .unwrap();
    assert!(cli.verbose);
    match cli.command {
        Commands::Stats {
            max_workers, quiet, ..
        } => {
            assert_eq!(max_workers, Some(3));
            assert!(quiet);
        }
        _ => panic!("expected stats command"),
    }

    let cli = Cli::try_parse_from([
        "mesh-processor",
        "monthly",
        "-i",
        "meshes",
        "-m",
        "54382129",
        "--variable",
        "temp_max",
    ])
    .unwrap();
    assert!(matches!(cli.command, Commands::Monthly { output_file: None, .. }));
}
