// Mirrors `static/` into `dist/` so the built site can be served as-is.
use std::path::Path;

use fs_extra::dir::{self, CopyOptions};

fn main() {
    println!("cargo:rerun-if-changed=static");

    let src = Path::new("static");
    if !src.exists() {
        return;
    }
    let dist = Path::new("dist");
    if let Err(err) = std::fs::create_dir_all(dist) {
        println!("cargo:warning=cannot create dist/: {err}");
        return;
    }

    let options = CopyOptions::new().overwrite(true).content_only(true);
    if let Err(err) = dir::copy(src, dist, &options) {
        println!("cargo:warning=copying static/ to dist/ failed: {err}");
    }
}
