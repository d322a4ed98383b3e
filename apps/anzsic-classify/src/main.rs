use std::process::ExitCode;

use clap::Parser;

use anzsic_classify::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
	color_eyre::install()?;

	let args = Args::parse();

	anzsic_classify::run(args).await
}
