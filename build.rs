use vergen_gitcl::{Cargo, Emitter, Gitcl};

fn main() -> Result<(), Box<dyn std::error::Error>> {
	Emitter::default()
		.add_instructions(&Cargo::builder().target_triple(true).build())?
		.add_instructions(&Gitcl::builder().sha(true).build())?
		.emit()?;

	Ok(())
}
