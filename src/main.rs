use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use school_records::{
    activity_log, admin, import_students, load_students_csv, open_database, school_stats,
    AppConfig, CascadeEngine, Course, Department, Faculty, NewAcademicYear, NewCourse,
    NewDepartment, NewFaculty, NewStudent, Student, AcademicYear,
};

const USAGE: &str = "Usage: school-records <init | seed | import <file.csv> | stats | logs [limit]>";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = AppConfig::from_env();
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("init") => run_init(&config),
        Some("seed") => run_seed(&config),
        Some("import") => match args.get(2) {
            Some(path) => run_import(&config, Path::new(path)),
            None => bail!("{}", USAGE),
        },
        Some("stats") => run_stats(&config),
        Some("logs") => {
            let limit = match args.get(2) {
                Some(raw) => raw.parse::<usize>().context("limit must be a number")?,
                None => config.log_page_size,
            };
            run_logs(&config, limit)
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn open(config: &AppConfig) -> Result<Connection> {
    let conn = open_database(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;
    admin::ensure_admin(&conn, &config.admin_password)?;
    Ok(conn)
}

fn run_init(config: &AppConfig) -> Result<()> {
    println!("🏫 School Records - Database Setup");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n🔧 Setting up database...");
    open(config)?;
    println!("✓ Database initialized with WAL mode: {}", config.db_path.display());
    println!("✓ Admin profile ready");

    Ok(())
}

fn run_seed(config: &AppConfig) -> Result<()> {
    println!("🌱 Seeding demo records...");
    let mut conn = open(config)?;
    let engine = CascadeEngine::new();

    engine.create::<AcademicYear>(
        &mut conn,
        NewAcademicYear {
            name: "2024-2025".to_string(),
            start_date: Some("2024-08-01".to_string()),
            end_date: Some("2025-05-31".to_string()),
            description: Some("Current school year".to_string()),
        },
    )?;
    engine.create::<Department>(
        &mut conn,
        NewDepartment {
            name: "Engineering".to_string(),
            head: Some("Dr. Smith".to_string()),
            email: Some("engineering@school.edu".to_string()),
            ..Default::default()
        },
    )?;
    engine.create::<Course>(
        &mut conn,
        NewCourse {
            name: "BSCE".to_string(),
            code: Some("CE-101".to_string()),
            description: Some("Bachelor of Science in Civil Engineering".to_string()),
            department: "Engineering".to_string(),
            ..Default::default()
        },
    )?;
    engine.create::<Faculty>(
        &mut conn,
        NewFaculty {
            name: "Prof. Brown".to_string(),
            email: "brown@school.edu".to_string(),
            position: Some("Professor".to_string()),
            department: "Engineering".to_string(),
            subject: Some("BSCE".to_string()),
            academic_year: Some("2024-2025".to_string()),
            ..Default::default()
        },
    )?;
    engine.create::<Student>(
        &mut conn,
        NewStudent {
            name: "Daniel Martinez".to_string(),
            email: "daniel@school.edu".to_string(),
            department: "Engineering".to_string(),
            course: Some("BSCE".to_string()),
            academic_year: Some("2024-2025".to_string()),
            year_level: Some(2),
            ..Default::default()
        },
    )?;

    println!("✓ Created Engineering with 1 course, 1 faculty member and 1 student");
    Ok(())
}

fn run_import(config: &AppConfig, csv_path: &Path) -> Result<()> {
    println!("📥 Student Import - CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading CSV...");
    let rows = load_students_csv(csv_path)?;
    println!("✓ Read {} rows from {}", rows.len(), csv_path.display());

    println!("\n💾 Creating students...");
    let mut conn = open(config)?;
    let report = import_students(&CascadeEngine::new(), &mut conn, rows)?;

    println!("✓ Created {} students", report.created);
    if !report.rejected.is_empty() {
        println!("⚠️  Rejected {} rows:", report.rejected.len());
        for rejected in &report.rejected {
            println!("   line {}: {}", rejected.line, rejected.reason);
        }
    }

    Ok(())
}

fn run_stats(config: &AppConfig) -> Result<()> {
    let conn = open(config)?;
    let stats = school_stats(&conn)?;

    println!("📊 School Records");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Students:       {}", stats.total_students);
    println!("Faculty:        {}", stats.total_faculty);
    println!("Courses:        {}", stats.total_courses);
    println!("Departments:    {}", stats.total_departments);
    println!("Academic years: {}", stats.total_academic_years);

    println!("\nStudents by department:");
    for group in &stats.students_by_department {
        println!("   {:<24} {}", group.name, group.count);
    }
    println!("\nStudents by course:");
    for group in &stats.students_by_course {
        println!("   {:<24} {}", group.name, group.count);
    }

    Ok(())
}

fn run_logs(config: &AppConfig, limit: usize) -> Result<()> {
    let conn = open(config)?;
    let entries = activity_log::list_recent(&conn, limit)?;

    println!("📝 Activity log (latest {})", entries.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for entry in entries {
        println!(
            "{}  {:<8} {:<14} [{}] {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.action.as_str(),
            entry.entity_type,
            entry.status.as_str(),
            entry.details
        );
    }

    Ok(())
}
