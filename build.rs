use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    // Templates are compiled in; cargo does not track them on its own.
    println!("cargo:rerun-if-changed=templates");
    watch_templates(Path::new("templates"));
    println!("cargo:rerun-if-changed=build.rs");

    // Shown in the footer.
    let build_id = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "dev".to_string());
    println!("cargo:rustc-env=EZHUMI_BUILD_ID={}", build_id);
}

fn watch_templates(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            watch_templates(&path);
        } else if path.extension().is_some_and(|ext| ext == "html") {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }
}
