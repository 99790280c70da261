//! Build script for storefront crate.
//!
//! Fingerprints the stylesheet and the page script so they can be served
//! with an immutable cache header. Each asset is copied into a `derived/`
//! directory next to it with its hash in the filename, and the hash is
//! exposed to the templates through a compile-time env var.

use std::env;
use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo");
    let static_dir = Path::new(&manifest_dir).join("static");

    fingerprint(&static_dir, "css", "main", "CSS_HASH");
    fingerprint(&static_dir, "js", "search", "JS_HASH");
}

/// Hash `static/<kind>/<stem>.<kind>` and copy it to
/// `static/<kind>/derived/<stem>.<hash>.<kind>`.
///
/// Sets `env_name` to the first 8 hex chars of the SHA-256, or to an empty
/// string when the asset is missing.
fn fingerprint(static_dir: &Path, kind: &str, stem: &str, env_name: &str) {
    let source = static_dir.join(kind).join(format!("{stem}.{kind}"));
    println!("cargo:rerun-if-changed={}", source.display());

    let content = match fs::read(&source) {
        Ok(content) => content,
        Err(e) => {
            println!("cargo:warning=Could not read {}: {e}", source.display());
            println!("cargo:rustc-env={env_name}=");
            return;
        }
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let short_hash = digest.get(..8).unwrap_or(&digest);
    println!("cargo:rustc-env={env_name}={short_hash}");

    let derived_dir = static_dir.join(kind).join("derived");
    fs::create_dir_all(&derived_dir).expect("Failed to create derived asset directory");
    fs::copy(&source, derived_dir.join(format!("{stem}.{short_hash}.{kind}")))
        .expect("Failed to copy asset to derived directory");
}
