//! Host-side helper: `cargo run` builds the wasm package into `static/pkg`
//! and serves `static/` locally so the hero sections can be viewed.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use std::process::{Command, Stdio};

    use anyhow::{bail, Context};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let port: u16 = match std::env::var("HERO_FX_PORT") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("HERO_FX_PORT={raw:?} is not a port number"))?,
        Err(_) => 8000,
    };

    log::info!("building wasm package");
    match Command::new("wasm-pack")
        .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
        .status()
    {
        Ok(status) if status.success() => {}
        Ok(status) => bail!("wasm-pack exited with {status}"),
        Err(err) => log::warn!("wasm-pack not runnable ({err}); serving whatever is in static/pkg"),
    }

    log::info!("serving static/ at http://127.0.0.1:{port}");
    let status = Command::new("python3")
        .args(["-m", "http.server", &port.to_string(), "--directory", "static"])
        .stdout(Stdio::null())
        .status()
        .context("failed to start python3 http.server")?;
    if !status.success() {
        bail!("http server exited with {status}");
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
