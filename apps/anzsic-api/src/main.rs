use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = anzsic_api::Args::parse();

	anzsic_api::run(args).await
}
