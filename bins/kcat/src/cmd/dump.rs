use std::io::{self, Write};

use super::config::Effective;
use super::error::CatError;

pub fn run(eff: &Effective) -> Result<bool, CatError> {
    let mut out = io::stdout().lock();
    kcat_rdkafka::dump_config(&eff.properties, &mut out)?;
    out.flush()?;
    Ok(true)
}
