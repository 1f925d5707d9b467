/// Implements [schemars::JsonSchema] by delegating to a "parameters" struct
///
/// Evaluators keep construction-time derived state (names, required columns) which is not
/// serialized, so their schema is the schema of the parameters they are built from.
macro_rules! json_schema {
    ($parameters: ty, $is_referenceable: expr_2021) => {
        fn is_referenceable() -> bool {
            $is_referenceable
        }

        fn schema_name() -> String {
            <$parameters>::schema_name()
        }

        fn json_schema(generator: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
            <$parameters>::json_schema(generator)
        }
    };
}

/// Implements [crate::FeatureNamesDescriptionsTrait] for a type with `properties` field
macro_rules! properties_names_descriptions {
    () => {
        fn get_names(&self) -> Vec<&str> {
            self.properties.names.iter().map(String::as_str).collect()
        }

        fn get_descriptions(&self) -> Vec<&str> {
            self.properties
                .descriptions
                .iter()
                .map(String::as_str)
                .collect()
        }
    };
}
