//! Build script rendering man pages for the binary and its subcommands.

use std::{fs, path::Path};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

const MAN_DIR: &str = "target/generated-man";

fn write_page(man: &Man, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut buf: Vec<u8> = Vec::new();
    man.render(&mut buf)?;
    fs::write(path, buf)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let out_dir = Path::new(MAN_DIR);
    fs::create_dir_all(out_dir)?;

    let cmd = cli::Cli::command();
    for sub in cmd.get_subcommands() {
        let name = format!("storyplan-{}", sub.get_name());
        let man = Man::new(sub.clone()).title(name.clone());
        write_page(&man, &out_dir.join(format!("{name}.1")))?;
    }
    write_page(&Man::new(cmd), &out_dir.join("storyplan.1"))
}
