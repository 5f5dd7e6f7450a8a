use anyhow::Result;

#[macro_use]
extern crate serde_derive;

mod cache;
mod cli;
mod common;
mod config;
mod dashboard;
mod normalize;
mod selection;
mod source;
mod video;
mod web;

fn main() -> Result<()> {
    cli::main()
}
