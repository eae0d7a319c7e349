use async_graphql::{Error, ErrorExtensions};
use tracing::error;

use crate::application::error::AppError;

/// Convert an application error into a GraphQL error carrying `extensions.code`.
pub(crate) fn graphql_error(err: AppError) -> Error {
    if err.is_internal() {
        error!(
            target = "lireddit::graphql",
            error = %err,
            code = err.code(),
            "resolver failed"
        );
    }
    let code = err.code();
    Error::new(err.presentation_message()).extend_with(|_, ext| ext.set("code", code))
}

pub(crate) trait GraphqlResultExt<T> {
    fn into_graphql(self) -> async_graphql::Result<T>;
}

impl<T, E> GraphqlResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn into_graphql(self) -> async_graphql::Result<T> {
        self.map_err(|err| graphql_error(err.into()))
    }
}
