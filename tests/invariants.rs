//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use std::fs;
use std::path::Path;

use nexus_guard::{
    compliance::ComplianceScanner,
    fingerprint,
    generator::Generator,
    manifest::RawPalette,
    migrate::replace_bounded,
    GuardPipeline, Manifest, MigrateOptions, MigrationEngine, MigrationOutcome, RenameMap,
    Section, SectionStatus,
};

const SHIPPED_MANIFEST: &str = include_str!("../data/canonical.json");

fn artifact_for(sections: &[Section]) -> String {
    let mut text = String::from("@import \"tailwindcss\";\n\n@theme {\n");
    for s in sections {
        text.push_str(&format!("  /* NX:{0}:START */ /* NX:{0}:END */\n\n", s.name));
    }
    text.push_str("}\n\n.app-shell { display: grid; }\n");
    text
}

fn palette() -> RawPalette {
    Manifest::from_json(SHIPPED_MANIFEST).unwrap().raw_palette
}

fn engine() -> MigrationEngine {
    MigrationEngine::new(&RenameMap::builtin().unwrap(), &palette()).unwrap()
}

/// Project root with the shipped manifest, a fresh artifact and a config
/// pointing every scan at `src/`.
fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("ui")).unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("ui/canonical.json"), SHIPPED_MANIFEST).unwrap();
    fs::write(root.join("ui/input.css"), artifact_for(&Section::standard())).unwrap();
    fs::write(
        root.join("nexus-guard.json"),
        r#"{"migrate": {"roots": ["src"]}, "check": {"roots": ["src"]}}"#,
    )
    .unwrap();
    dir
}

#[test]
fn invariant_generate_is_idempotent() {
    let dir = project();
    let pipeline = GuardPipeline::open(dir.path(), None).unwrap();

    let (_, first) = pipeline.generate().unwrap();
    assert!(first.changed);
    let after_first = fs::read(pipeline.artifact_path()).unwrap();

    let (_, second) = pipeline.generate().unwrap();
    assert!(!second.changed, "Second run must not write");
    assert_eq!(after_first, fs::read(pipeline.artifact_path()).unwrap());
    assert_eq!(first.sections, second.sections);
}

#[test]
fn invariant_generated_artifact_validates() {
    let dir = project();
    let pipeline = GuardPipeline::open(dir.path(), None).unwrap();

    let before = pipeline.validate().unwrap();
    assert!(!before.is_clean());
    assert!(matches!(
        before.status_of("SPACING"),
        Some(SectionStatus::Missing { .. })
    ));

    pipeline.generate().unwrap();
    let report = pipeline.validate().unwrap();
    assert!(report.is_clean());
    assert_eq!(report.sections.len(), 12);
    assert_eq!(report.manifest_version, "1.0.0");
}

#[test]
fn invariant_drift_is_detected_by_hash() {
    let dir = project();
    let pipeline = GuardPipeline::open(dir.path(), None).unwrap();
    pipeline.generate().unwrap();

    let mut manifest: serde_json::Value = serde_json::from_str(SHIPPED_MANIFEST).unwrap();
    manifest["tables"]["RADIUS"]["xl"] = serde_json::json!("99rem");
    fs::write(pipeline.manifest_path(), manifest.to_string()).unwrap();

    let report = pipeline.validate().unwrap();
    assert_eq!(report.drift_count(), 1);
    match report.status_of("RADIUS") {
        Some(SectionStatus::Drift { expected, actual }) => assert_ne!(expected, actual),
        other => panic!("Expected RADIUS drift, got {:?}", other),
    }
    assert!(matches!(report.status_of("SPACING"), Some(SectionStatus::Ok { .. })));
}

#[test]
fn invariant_text_outside_markers_is_preserved() {
    let sections = vec![Section::flat("SPACING", "--nx-space-")];
    let manifest = Manifest::from_json(r#"{"version": "1.0.0", "tables": {"SPACING": {"4": "1rem"}}}"#).unwrap();
    let prefix = "/* hand-written */\n:root { --legacy: 1px; }\n@theme {\n  ";
    let suffix = "\n}\n.card { color: red; } /* NX:OTHER:START */\n";
    let artifact = format!("{}/* NX:SPACING:START */ stale /* NX:SPACING:END */{}", prefix, suffix);

    let rendered = Generator::new(&sections).render(&manifest, &artifact).unwrap();
    assert!(rendered.text.starts_with(&format!("{}/* NX:SPACING:START */", prefix)));
    assert!(rendered.text.ends_with(&format!("/* NX:SPACING:END */{}", suffix)));
    assert!(!rendered.text.contains("stale"));
}

#[test]
fn scenario_spacing_section_round_trip() {
    let sections = vec![Section::flat("SPACING", "--nx-space-")];
    let manifest = Manifest::from_json(r#"{"version": "1.0.0", "tables": {"SPACING": {"4": "1rem"}}}"#).unwrap();
    let artifact = artifact_for(&sections);

    let rendered = Generator::new(&sections).render(&manifest, &artifact).unwrap();
    let hash = fingerprint(br#"{"4":"1rem"}"#);
    assert!(rendered.text.contains(&format!("/* HASH: {} */", hash)));
    assert!(rendered.text.contains("  --nx-space-4: 1rem;\n"));

    let report = nexus_guard::Validator::new(&sections)
        .validate(&manifest, &rendered.text)
        .unwrap();
    assert_eq!(report.status_of("SPACING"), Some(&SectionStatus::Ok { hash }));
}

#[test]
fn invariant_shipped_rename_map_verifies() {
    let map = RenameMap::builtin().unwrap();
    assert_eq!(map.legacy_prefix, "na-");
    assert!(MigrationEngine::new(&map, &palette()).is_ok());
}

#[test]
fn invariant_mapped_tokens_leave_no_residue() {
    let map = RenameMap::builtin().unwrap();
    let mut text = String::new();
    for old in map.classes.keys().chain(map.raw_values.keys()) {
        text.push_str(&format!("<div className=\"{}\" />\n", old));
    }
    for old in map.classes.keys() {
        text.push_str(&format!(".{} {{\n}}\n", old));
    }
    for old in map.imports.keys() {
        text.push_str(&format!("import {{ x }} from \"{}\";\n", old));
    }

    let result = engine().migrate_text(&text);
    assert!(result.unmapped.is_empty(), "Residue: {:?}", result.unmapped);
    assert!(result.replacements >= map.classes.len() * 2 + map.raw_values.len());
}

#[test]
fn invariant_boundary_respected() {
    let (out, n) = replace_bounded(
        "class=\"na-p-4x na-p-4\"",
        "na-p-4",
        "p-4",
        |c| matches!(c, Some('"') | Some(' ')),
        |c| matches!(c, Some('"') | Some(' ')),
    );
    assert_eq!(out, "class=\"na-p-4x p-4\"");
    assert_eq!(n, 1);

    let result = engine().migrate_text("<div className=\"na-p-4x\" />");
    assert!(result.content.contains("na-p-4x"));
    assert_eq!(result.unmapped, vec!["na-p-4x".to_string()]);
}

#[test]
fn invariant_status_literals_untouched() {
    let source = r#"const tone = status === "ok" ? 'warn' : `idle`;"#;
    let result = engine().migrate_text(source);
    assert_eq!(result.content, source);
    assert_eq!(result.replacements, 0);

    let badge = engine().migrate_text(r#"<span className="na-status na-status-ok" />"#);
    assert_eq!(badge.content, r#"<span className="badge badge-success" />"#);
}

#[test]
fn scenario_strict_migration_fails_on_unmapped() {
    let dir = project();
    let file = dir.path().join("src/page.tsx");
    let source = "export const Page = () => <div class=\"na-unknown-token\" />;\n";
    fs::write(&file, source).unwrap();

    let pipeline = GuardPipeline::open(dir.path(), None).unwrap();
    let report = pipeline
        .migrate(MigrateOptions { dry_run: true, strict: true })
        .unwrap();

    assert_eq!(report.outcome(), MigrationOutcome::FailedUnmapped);
    assert_eq!(report.outcome().exit_code(), 1);
    assert!(report.unmapped.contains("na-unknown-token"));
    assert_eq!(report.files_with_unmapped, vec![Path::new("src/page.tsx").to_path_buf()]);
    assert_eq!(fs::read_to_string(&file).unwrap(), source);
}

#[test]
fn scenario_migration_rewrites_files() {
    let dir = project();
    let file = dir.path().join("src/card.tsx");
    fs::write(
        &file,
        "import { Card } from \"@aibos/kernel\";\nexport const C = () => <div className=\"na-card\" />;\n",
    )
    .unwrap();

    let pipeline = GuardPipeline::open(dir.path(), None).unwrap();
    let report = pipeline.migrate(MigrateOptions::default()).unwrap();

    assert_eq!(report.outcome(), MigrationOutcome::Completed);
    assert_eq!(report.total_replacements, 2);
    let migrated = fs::read_to_string(&file).unwrap();
    assert!(migrated.contains("\"@nexus/kernel\""));
    assert!(!migrated.contains("na-card"));
}

#[test]
fn scenario_forbidden_pattern_reported_once() {
    let scanner = ComplianceScanner::new(&["bg-red-".to_string()]).unwrap();
    let violations = scanner.scan_text(Path::new("app.tsx"), "<div className=\"bg-red-500\" />");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].line, 1);
    assert_eq!(violations[0].pattern, "bg-red-");
}

#[test]
fn scenario_check_over_project() {
    let dir = project();
    fs::write(dir.path().join("src/ok.tsx"), "<div className=\"bg-nx-surface\" />\n").unwrap();
    let pipeline = GuardPipeline::open(dir.path(), None).unwrap();
    assert!(pipeline.check().unwrap().is_clean());

    fs::write(dir.path().join("src/bad.tsx"), "\n<div className=\"bg-red-500\" />\n").unwrap();
    let report = pipeline.check().unwrap();
    assert_eq!(report.files_scanned, 2);
    assert!(!report.is_clean());
    let hit = report.violations.iter().find(|v| v.pattern == "bg-red-").unwrap();
    assert_eq!(hit.file, Path::new("src/bad.tsx"));
    assert_eq!(hit.line, 2);
}

#[test]
fn scenario_unreadable_file_does_not_abort_batch() {
    let dir = project();
    let broken = dir.path().join("src/a.tsx");
    let good = dir.path().join("src/b.tsx");
    fs::write(&broken, [0xff_u8, 0xfe]).unwrap();
    fs::write(&good, "<div className=\"na-card\" />\n").unwrap();

    let pipeline = GuardPipeline::open(dir.path(), None).unwrap();
    let report = pipeline.migrate(MigrateOptions::default()).unwrap();
    assert_eq!(report.outcome(), MigrationOutcome::FailedErrors);
    assert_eq!(report.outcome().exit_code(), 1);
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.total_replacements, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("src/a.tsx"));
    assert_eq!(fs::read_to_string(&good).unwrap(), "<div className=\"card\" />\n");
    assert_eq!(fs::read(&broken).unwrap(), vec![0xff, 0xfe]);

    let check = pipeline.check().unwrap();
    assert_eq!(check.files_scanned, 2);
    assert!(check.violations.is_empty());
    assert_eq!(check.errors.len(), 1);
    assert!(!check.is_clean());
}

#[test]
fn invariant_failed_generate_leaves_artifact_untouched() {
    let dir = project();
    let pipeline = GuardPipeline::open(dir.path(), None).unwrap();
    let broken = artifact_for(&Section::standard()).replace("/* NX:ZINDEX:END */", "");
    fs::write(pipeline.artifact_path(), &broken).unwrap();

    assert!(pipeline.generate().is_err());
    assert_eq!(fs::read_to_string(pipeline.artifact_path()).unwrap(), broken);
}
