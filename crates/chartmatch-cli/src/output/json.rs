use chartmatch_core::error::ChartMatchError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), ChartMatchError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
