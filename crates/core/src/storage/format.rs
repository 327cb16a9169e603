use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::holding::{is_valid_amount, Holding};

/// Current holdings file schema version.
pub const CURRENT_VERSION: u16 = 1;

/// On-disk layout of the holdings file.
///
/// ```text
/// {
///   "version": 1,
///   "holdings": [ { "id": "bitcoin", "amount": 2.0 }, ... ]
/// }
/// ```
///
/// Holdings keep insertion order. Unknown top-level fields are ignored so a
/// newer writer can add fields without breaking older readers of the same
/// version.
#[derive(Debug, Serialize, Deserialize)]
struct HoldingsFile {
    version: u16,
    holdings: Vec<Holding>,
}

/// Serialize holdings into the versioned, pretty-printed JSON document.
pub fn write_holdings(holdings: &[Holding]) -> Result<Vec<u8>, CoreError> {
    let file = HoldingsFile {
        version: CURRENT_VERSION,
        holdings: holdings.to_vec(),
    };
    serde_json::to_vec_pretty(&file)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize holdings: {e}")))
}

/// Parse and validate a holdings document.
pub fn read_holdings(data: &[u8]) -> Result<Vec<Holding>, CoreError> {
    let file: HoldingsFile = serde_json::from_slice(data)
        .map_err(|e| CoreError::InvalidFileFormat(format!("Not a holdings file: {e}")))?;

    if file.version == 0 || file.version > CURRENT_VERSION {
        return Err(CoreError::UnsupportedVersion(file.version));
    }

    for (index, holding) in file.holdings.iter().enumerate() {
        if holding.id.trim().is_empty() {
            return Err(CoreError::InvalidFileFormat(format!(
                "Holding #{index} has an empty id"
            )));
        }
        if !is_valid_amount(holding.amount) {
            return Err(CoreError::InvalidFileFormat(format!(
                "Holding #{index} ({}) has invalid amount {}",
                holding.id, holding.amount
            )));
        }
    }

    Ok(file.holdings)
}
