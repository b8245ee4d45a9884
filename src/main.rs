mod app;
mod body;
mod cli;
mod config;
mod input;
mod orbit;
mod render;
mod system;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
