//! Locating a sans-serif face among the platform's installed fonts.
//!
//! Mirrors the `system-ui, -apple-system, sans-serif` stack: the first
//! candidate file that exists and parses wins.

use std::path::{Path, PathBuf};

/// File names tried in order, regular weight only.
const SANS_SERIF_CANDIDATES: &[&str] = &[
    "segoeui.ttf",
    "SFNS.ttf",
    "Helvetica.ttc",
    "arial.ttf",
    "Arial.ttf",
    "DejaVuSans.ttf",
    "NotoSans-Regular.ttf",
    "LiberationSans-Regular.ttf",
    "FreeSans.ttf",
];

/// How deep to descend below each font directory. Linux distributions nest
/// faces as `truetype/<family>/<file>`.
const MAX_DEPTH: usize = 3;

pub fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(extra) = std::env::var("VISION_CANVAS_FONT_DIR") {
        for path in std::env::split_paths(&extra) {
            if !path.as_os_str().is_empty() {
                dirs.push(path);
            }
        }
    }

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".fonts"));
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    dirs
}

/// Find and read the first usable sans-serif face.
pub fn load_sans_serif() -> Option<(PathBuf, Vec<u8>)> {
    let dirs = system_font_dirs();
    for name in SANS_SERIF_CANDIDATES {
        for dir in &dirs {
            let Some(path) = find_file(dir, name, MAX_DEPTH) else {
                continue;
            };
            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            if ttf_parser::Face::parse(&bytes, 0).is_ok() {
                return Some((path, bytes));
            }
        }
    }
    None
}

fn find_file(dir: &Path, name: &str, depth: usize) -> Option<PathBuf> {
    let direct = dir.join(name);
    if direct.is_file() {
        return Some(direct);
    }
    if depth == 0 {
        return None;
    }
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    // read_dir order is platform-dependent
    subdirs.sort();
    subdirs
        .iter()
        .find_map(|sub| find_file(sub, name, depth - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_file_in_nested_dir() {
        let root = std::env::temp_dir().join(format!("vision_canvas_fonts_{}", std::process::id()));
        let nested = root.join("truetype").join("demo");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("Demo.ttf"), b"not a font").unwrap();

        let found = find_file(&root, "Demo.ttf", MAX_DEPTH).unwrap();
        assert_eq!(found, nested.join("Demo.ttf"));
        assert!(find_file(&root, "Demo.ttf", 1).is_none());
        assert!(find_file(&root, "Missing.ttf", MAX_DEPTH).is_none());

        let _ = std::fs::remove_dir_all(&root);
    }
}
