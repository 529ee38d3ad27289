#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{schema::Schema, RefOr};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.expect("components are generated");
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            _ => panic!("{name} should be an object schema"),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        let components = openapi.components.as_ref().unwrap();
        assert!(components.schemas.contains_key("ErrorResponse"));
        assert!(components.schemas.contains_key("HealthResponse"));
        assert!(components.security_schemes.contains_key("jwt"));
        assert!(components.security_schemes.contains_key("basic"));

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_every_route_group_is_documented() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        for path in [
            "/health",
            "/api/v1/auth/register",
            "/api/v1/auth/login",
            "/api/v1/auth/verify-token",
            "/api/v1/auth/logout",
            "/api/v1/user",
            "/api/v1/users/{id}",
            "/api/v1/user/alamat/{id}",
            "/api/v1/category/{id}",
            "/api/v1/toko/my",
            "/api/v1/toko/{id_toko}",
            "/api/v1/product/{id}",
            "/api/v1/trx/{id}",
            "/api/v1/provcity/listcities/{prov_id}",
        ] {
            assert!(paths.contains_key(path), "{path} is missing from the document");
        }
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        for field in ["status", "message", "errors", "data"] {
            assert!(properties.contains(&field.to_string()), "missing {field}");
        }
    }

    #[test]
    fn test_health_response_schema_structure() {
        let properties = object_properties("HealthResponse");
        for field in ["status", "version", "database"] {
            assert!(properties.contains(&field.to_string()), "missing {field}");
        }
    }

    #[test]
    fn test_trx_response_keeps_snapshot_fields() {
        let properties = object_properties("TrxLineResponse");
        for field in ["product", "toko", "kuantitas", "harga_total"] {
            assert!(properties.contains(&field.to_string()), "missing {field}");
        }
    }
}
