//! NFT metadata documents and the builder that produces them.
//!
//! Metadata construction is a pure function of the ticket attributes and
//! event context: the same inputs always yield a byte-identical serialized
//! document, with a fixed attribute order. The uploaded document's address
//! in content-addressed storage therefore only changes when the inputs do.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `trait_type`/`value` pair in an NFT metadata document.
///
/// Values are JSON values so numeric traits (ticket number, supply) stay
/// numeric in the serialized document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NftAttribute {
    /// Trait name, e.g. `"Ticket Number"`.
    pub trait_type: String,
    /// Trait value.
    pub value: Value,
}

impl NftAttribute {
    /// Build an attribute with a string value.
    pub fn text(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: Value::String(value.into()),
        }
    }

    /// Build an attribute with a numeric value.
    pub fn number(trait_type: impl Into<String>, value: i64) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: Value::from(value),
        }
    }
}

/// An ERC-721 style metadata document for one ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NftMetadata {
    /// Token name.
    pub name: String,
    /// Token description.
    pub description: String,
    /// Image URI; empty when the ticket has no artwork.
    pub image: String,
    /// Ordered attribute list; always contains at least
    /// `Ticket Number` and `Total Supply`.
    pub attributes: Vec<NftAttribute>,
}

impl NftMetadata {
    /// Serialize the document to its canonical JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, which only happens when a
    /// non-string attribute value cannot be represented.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Presentation inputs shared by every ticket in an issuance batch.
#[derive(Clone, Debug, Default)]
pub struct TicketTemplate {
    /// Base ticket name; the per-ticket name appends `#<number>`.
    pub ticket_name: String,
    /// Optional description override.
    pub description: Option<String>,
    /// Optional artwork URI.
    pub image_url: Option<String>,
    /// Optional ticket class, e.g. `"VIP"`.
    pub ticket_type: Option<String>,
    /// Optional face price, carried into the document as an attribute.
    pub price: Option<f64>,
}

/// Build the metadata document for one ticket.
///
/// Pure and deterministic. Attribute order is fixed: `Ticket Number`,
/// `Total Supply`, then `Ticket Type` and `Price` when the template
/// carries them.
#[must_use]
pub fn build_ticket_metadata(
    event_name: &str,
    template: &TicketTemplate,
    ticket_number: i64,
    total_supply: i64,
) -> NftMetadata {
    let mut attributes = vec![
        NftAttribute::number("Ticket Number", ticket_number),
        NftAttribute::number("Total Supply", total_supply),
    ];
    if let Some(ticket_type) = &template.ticket_type {
        attributes.push(NftAttribute::text("Ticket Type", ticket_type.clone()));
    }
    if let Some(price) = template.price {
        attributes.push(NftAttribute {
            trait_type: "Price".to_string(),
            value: Value::from(price),
        });
    }

    let description = template
        .description
        .clone()
        .unwrap_or_else(|| format!("Admission ticket for {event_name}"));

    NftMetadata {
        name: format!("{} #{ticket_number}", template.ticket_name),
        description,
        image: template.image_url.clone().unwrap_or_default(),
        attributes,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn template() -> TicketTemplate {
        TicketTemplate {
            ticket_name: "General Admission".to_string(),
            description: None,
            image_url: Some("ipfs://QmArtwork".to_string()),
            ticket_type: Some("GA".to_string()),
            price: None,
        }
    }

    #[test]
    fn builds_expected_document() {
        let doc = build_ticket_metadata("Rust Conf", &template(), 7, 100);

        assert_eq!(doc.name, "General Admission #7");
        assert_eq!(doc.description, "Admission ticket for Rust Conf");
        assert_eq!(doc.image, "ipfs://QmArtwork");
        assert_eq!(doc.attributes[0].trait_type, "Ticket Number");
        assert_eq!(doc.attributes[0].value, serde_json::json!(7));
        assert_eq!(doc.attributes[1].trait_type, "Total Supply");
        assert_eq!(doc.attributes[1].value, serde_json::json!(100));
        assert_eq!(doc.attributes[2].trait_type, "Ticket Type");
    }

    #[test]
    fn description_override_wins() {
        let mut t = template();
        t.description = Some("Front row access".to_string());
        let doc = build_ticket_metadata("Rust Conf", &t, 1, 1);
        assert_eq!(doc.description, "Front row access");
    }

    #[test]
    fn omits_ticket_type_when_absent() {
        let mut t = template();
        t.ticket_type = None;
        let doc = build_ticket_metadata("Rust Conf", &t, 1, 10);
        assert_eq!(doc.attributes.len(), 2);
    }

    proptest! {
        #[test]
        fn deterministic_for_all_inputs(number in 1i64..=1000, total in 1i64..=1000) {
            let a = build_ticket_metadata("Rust Conf", &template(), number, total);
            let b = build_ticket_metadata("Rust Conf", &template(), number, total);
            prop_assert_eq!(a.to_json_bytes().unwrap(), b.to_json_bytes().unwrap());
        }
    }
}
