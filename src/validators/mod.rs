//! The rule validator battery.
//!
//! Each validator is a pure function from a matched (interaction, operation)
//! or (interaction, response) pair to a list of results. Validators run
//! unconditionally and independently; results from several validators can
//! legitimately co-occur for the same interaction and are simply
//! concatenated by the caller.

pub(crate) mod body;
pub(crate) mod content;
pub(crate) mod params;
pub(crate) mod security;

/// Append a schema error's keyword path to a spec schema location, turning
/// `/properties/id/type` into `<location>.properties.id.type`.
pub(crate) fn spec_schema_location(schema_location: &str, schema_path: &str) -> String {
    let dotted = schema_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".");
    if dotted.is_empty() {
        schema_location.to_string()
    } else {
        format!("{schema_location}.{dotted}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_path_appends_dotted() {
        assert_eq!(
            spec_schema_location("[root].paths./a.get.responses.200.schema", "/properties/id/type"),
            "[root].paths./a.get.responses.200.schema.properties.id.type"
        );
    }

    #[test]
    fn empty_schema_path_keeps_location() {
        assert_eq!(spec_schema_location("loc", ""), "loc");
        assert_eq!(spec_schema_location("loc", "/"), "loc");
    }
}
