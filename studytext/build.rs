use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const SCHEME_HEADER: &str = "latn,tel,sign,kind";

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=data/translit");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("scheme_data.rs");

    // Discover transliteration schemes: one CSV per scheme code.
    let mut schemes = Vec::new();
    for entry in WalkDir::new(manifest_dir.join("data/translit"))
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if let Some(code) = extract_scheme_code(path) {
            check_scheme(path)?;
            schemes.push((code, path.to_path_buf()));
        }
    }
    schemes.sort();
    if schemes.is_empty() {
        bail!("no transliteration schemes found under data/translit");
    }

    let mut generated_code = String::new();
    generated_code.push_str("pub static AVAILABLE_SCHEMES: &[&str] = &[\n");
    for (code, _) in &schemes {
        generated_code.push_str(&format!("    \"{code}\",\n"));
    }
    generated_code.push_str("];\n\n");

    generated_code.push_str("fn get_scheme_data(code: &str) -> Option<&'static str> {\n");
    generated_code.push_str("    match code {\n");
    for (code, path) in &schemes {
        generated_code.push_str(&format!(
            "        \"{code}\" => Some(include_str!({:?})),\n",
            path.display().to_string()
        ));
    }
    generated_code.push_str("        _ => None,\n    }\n}\n");

    fs::write(&dest_path, generated_code).context("Failed to write generated scheme table")?;
    Ok(())
}

fn extract_scheme_code(path: &Path) -> Option<String> {
    path.file_name()?
        .to_str()?
        .strip_suffix(".csv")
        .map(|stem| stem.to_string())
}

fn check_scheme(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scheme file: {}", path.display()))?;
    let header = content.lines().next().unwrap_or_default().trim();
    if header != SCHEME_HEADER {
        bail!(
            "{}: expected header '{SCHEME_HEADER}', found '{header}'",
            path.display()
        );
    }
    Ok(())
}
