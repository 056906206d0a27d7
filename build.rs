use std::path::{Path, PathBuf};
use std::process::Command;

const MAX_LINES: usize = 750;

const CHECKED_EXTENSIONS: &[&str] = &["rs", "md", "yaml", "toml"];

const EXCLUDED_DIRS: &[&str] = &["target", ".git", "node_modules", "examples"];

const EXCLUDED_FILES: &[&str] = &["Cargo.lock"];

type Violations = Vec<(PathBuf, usize, String)>;

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set");
    let root = PathBuf::from(&manifest_dir);
    let files = collect_files_to_check(&root);

    for file in &files {
        println!("cargo:rerun-if-changed={}", file.display());
    }

    let sources: Vec<(PathBuf, String)> = files
        .iter()
        .filter(|p| {
            p.extension().and_then(|e| e.to_str()) == Some("rs")
                && p.file_name().and_then(|n| n.to_str()) != Some("build.rs")
        })
        .filter_map(|p| {
            let content = std::fs::read_to_string(p).ok()?;
            Some((p.strip_prefix(&root).unwrap_or(p).to_path_buf(), content))
        })
        .collect();

    enforce_line_limits(&root, &files);
    enforce_no_dead_code_allows(&sources);
    enforce_test_hygiene(&sources);
}

fn enforce_line_limits(root: &Path, files: &[PathBuf]) {
    let mut violations = Violations::new();
    for file in files {
        let rel_path = file.strip_prefix(root).unwrap_or(file).to_path_buf();
        match std::fs::read_to_string(file) {
            Ok(content) => {
                let lines = count_non_empty_lines(&content);
                if lines > MAX_LINES {
                    let detail = format!("{} lines (exceeds by {})", lines, lines - MAX_LINES);
                    violations.push((rel_path, lines, detail));
                }
            }
            Err(e) => println!(
                "cargo:warning=Could not read file {}: {}",
                rel_path.display(),
                e
            ),
        }
    }

    fail_on(
        &format!("FILE LINE LIMIT EXCEEDED (max {} lines)", MAX_LINES),
        &violations,
        &["Please split these files into smaller modules."],
    );
}

fn enforce_no_dead_code_allows(sources: &[(PathBuf, String)]) {
    let mut violations = Violations::new();
    for (path, content) in sources {
        for (line_num, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if (trimmed.starts_with("#[allow(") || trimmed.starts_with("#![allow("))
                && trimmed.contains("dead_code")
            {
                violations.push((path.clone(), line_num + 1, trimmed.to_string()));
            }
        }
    }

    fail_on(
        "#[allow(dead_code)] IS NOT ALLOWED",
        &violations,
        &[
            "Delete unused code instead of silencing the warning.",
            "If the code is only for tests, put it behind #[cfg(test)].",
        ],
    );
}

/// One `#[test]` / `#[tokio::test]` function body.
struct TestFn<'a> {
    start_line: usize,
    name: String,
    serial: bool,
    lines: Vec<&'a str>,
}

/// Splits a file into its test functions by brace depth.
fn test_functions(content: &str) -> Vec<TestFn<'_>> {
    let lines: Vec<&str> = content.lines().collect();
    let mut tests = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let trimmed = lines[i].trim();
        if trimmed != "#[test]" && !trimmed.starts_with("#[tokio::test") {
            i += 1;
            continue;
        }

        let start_line = i + 1;
        let mut serial = i > 0 && is_serial_attr(lines[i - 1]);
        let mut j = i + 1;
        while j < lines.len() && !lines[j].contains("fn ") {
            serial |= is_serial_attr(lines[j]);
            j += 1;
        }
        let name = lines
            .get(j)
            .and_then(|l| l.split("fn ").nth(1))
            .and_then(|after| after.split('(').next())
            .unwrap_or("")
            .trim()
            .to_string();

        let mut depth = 0i32;
        let mut body = Vec::new();
        let mut opened = false;
        while j < lines.len() {
            body.push(lines[j]);
            for c in lines[j].chars() {
                match c {
                    '{' => {
                        depth += 1;
                        opened = true;
                    }
                    '}' => depth -= 1,
                    _ => {}
                }
            }
            j += 1;
            if opened && depth <= 0 {
                break;
            }
        }

        tests.push(TestFn {
            start_line,
            name,
            serial,
            lines: body,
        });
        i = j;
    }
    tests
}

fn is_serial_attr(line: &str) -> bool {
    matches!(line.trim(), "#[serial]" | "#[serial_test::serial]")
}

/// Bans tests that silently skip, and requires #[serial] for env mutation.
fn enforce_test_hygiene(sources: &[(PathBuf, String)]) {
    let skip_patterns = ["Skipping test", "skipping test", "Test skipped", "test skipped"];
    let mut skips = Violations::new();
    let mut env_mutations = Violations::new();

    for (path, content) in sources {
        for test in test_functions(content) {
            let mut depth = 0i32;
            for line in &test.lines {
                let trimmed = line.trim();
                if let Some(pattern) = skip_patterns.iter().find(|p| line.contains(**p)) {
                    let detail = format!("test `{}` contains skip pattern: {}", test.name, pattern);
                    skips.push((path.clone(), test.start_line, detail));
                    break;
                }
                // A bare return inside a nested block is a conditional early exit.
                if trimmed == "return;" && depth > 1 {
                    let detail = format!("test `{}` has conditional early return", test.name);
                    skips.push((path.clone(), test.start_line, detail));
                    break;
                }
                depth += line.matches('{').count() as i32 - line.matches('}').count() as i32;
            }

            let mutates_env = test.lines.iter().any(|line| {
                let trimmed = line.trim();
                !trimmed.starts_with("//")
                    && (trimmed.contains("env::set_var") || trimmed.contains("env::remove_var"))
            });
            if mutates_env && !test.serial {
                let detail = format!("test `{}` mutates env without #[serial]", test.name);
                env_mutations.push((path.clone(), test.start_line, detail));
            }
        }
    }

    fail_on(
        "SILENT TEST SKIPS ARE NOT ALLOWED",
        &skips,
        &["Tests must FAIL if they cannot run. Assert preconditions instead."],
    );
    fail_on(
        "ENV MUTATIONS REQUIRE #[serial]",
        &env_mutations,
        &["Add #[serial] from serial_test to tests that call set_var or remove_var."],
    );
}

fn fail_on(title: &str, violations: &Violations, advice: &[&str]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n========================================");
    eprintln!("{}", title);
    eprintln!("========================================");
    for (path, line, detail) in violations {
        eprintln!("  {}:{}", path.display(), line);
        eprintln!("    {}", detail);
    }
    eprintln!("========================================");
    for line in advice {
        eprintln!("{}", line);
    }
    eprintln!();
    panic!("Build failed: {} ({} violation(s))", title, violations.len());
}

fn collect_files_to_check(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Ok(output) = Command::new("git")
        .args(["ls-files"])
        .current_dir(root)
        .output()
    {
        if output.status.success() {
            if let Ok(stdout) = String::from_utf8(output.stdout) {
                files.extend(
                    stdout
                        .lines()
                        .map(|line| root.join(line))
                        .filter(|path| should_check_file(path, root)),
                );
                return files;
            }
        }
    }

    walk_directory(root, root, &mut files);
    files
}

fn walk_directory(dir: &Path, root: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let excluded = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| EXCLUDED_DIRS.contains(&name));
            if !excluded {
                walk_directory(&path, root, files);
            }
        } else if should_check_file(&path, root) {
            files.push(path);
        }
    }
}

fn should_check_file(path: &Path, root: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    if !CHECKED_EXTENSIONS.contains(&ext) {
        return false;
    }

    let Ok(rel_path) = path.strip_prefix(root) else {
        return true;
    };
    let rel_str = rel_path.to_string_lossy();
    if EXCLUDED_FILES.iter().any(|excluded| rel_str == *excluded) {
        return false;
    }
    !rel_path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
    })
}

fn count_non_empty_lines(content: &str) -> usize {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .count()
}
