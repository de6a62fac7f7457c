use http::Method;
use std::collections::HashMap;

/// Collection segment shared by both routes.
pub const COLLECTION: &str = "test";
/// Path parameter holding the record identifier.
pub const ID_PARAMETER: &str = "id";

/// The operations exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `GET /test/{id}`, the identifier may be empty
    GetItem(String),
    /// `POST /test`
    PutItem,
}

impl Route {
    /// Match a request against the route table.
    /// The identifier is taken from the `id` path parameter, or the last path segment without one.
    pub fn resolve(
        method: &Method,
        path: &str,
        path_parameters: &HashMap<String, String>,
    ) -> Option<Route> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

        match segments.as_slice() {
            [COLLECTION] if *method == Method::POST => Some(Route::PutItem),
            [COLLECTION, id] if *method == Method::GET => {
                let id: String = path_parameters
                    .get(ID_PARAMETER)
                    .cloned()
                    .unwrap_or_else(|| id.to_string());

                Some(Route::GetItem(id))
            }
            _ => None,
        }
    }

    /// Name used for logging and in error responses.
    pub fn operation(&self) -> &'static str {
        match self {
            Route::GetItem(_) => "get_item",
            Route::PutItem => "put_item",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(method: Method, path: &str) -> Option<Route> {
        Route::resolve(&method, path, &HashMap::new())
    }

    #[test]
    fn get_with_id_resolves_to_get_item() {
        assert_eq!(Some(Route::GetItem("42".to_string())), resolve(Method::GET, "/test/42"));
    }

    #[test]
    fn get_prefers_path_parameter() {
        let parameters: HashMap<String, String> =
            HashMap::from([(ID_PARAMETER.to_string(), "a b".to_string())]);

        let route: Option<Route> = Route::resolve(&Method::GET, "/test/a%20b", &parameters);

        assert_eq!(Some(Route::GetItem("a b".to_string())), route);
    }

    #[test]
    fn get_with_empty_id_still_resolves() {
        assert_eq!(Some(Route::GetItem(String::new())), resolve(Method::GET, "/test/"));
    }

    #[test]
    fn post_to_collection_resolves_to_put_item() {
        assert_eq!(Some(Route::PutItem), resolve(Method::POST, "/test"));
    }

    #[test]
    fn unknown_routes_do_not_resolve() {
        assert_eq!(None, resolve(Method::GET, "/test"));
        assert_eq!(None, resolve(Method::POST, "/test/42"));
        assert_eq!(None, resolve(Method::GET, "/other/42"));
        assert_eq!(None, resolve(Method::GET, "/test/42/extra"));
    }
}
