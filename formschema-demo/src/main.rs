//! Compiles the sample sign-up form, merges the hand-written overrides, and
//! validates one candidate record.
//!
//! Logging follows `FORMSCHEMA_LOG` (filter) and `FORMSCHEMA_LOG_FORMAT`
//! (`pretty` or `json`).

use formschema::prelude::*;
use formschema::testing::{min_ten_rule, sample_overrides, sample_record};
use tracing::info;

const SAMPLE_TABLE: &str = include_str!("../sample_table.json");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(&LoggingConfig::from_env())?;

    register_rule(min_ten_rule());

    let table = DescriptorTable::from_json_str(SAMPLE_TABLE)?;
    let validator = compile(&table)?.merge_overrides(&sample_overrides());
    info!(
        descriptors = table.len(),
        fields = validator.len(),
        "Schema ready"
    );

    match validator
        .validate(&sample_record(), &ValidateOptions::collect_all())
        .await
    {
        Ok(record) => {
            println!("------------- Valid ---------------");
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Err(ValidationError::Invalid(errors)) => {
            println!("************** Errors *********************");
            println!("{}", serde_json::to_string_pretty(&errors)?);
        }
        Err(ValidationError::Schema(err)) => return Err(err.into()),
    }

    Ok(())
}
