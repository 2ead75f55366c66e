use crate::error::ApiError;

/// State of a view that is fed by one fetch.
///
/// Starts in `Loading`; a reply moves it to `Ready` or `Failed` and nothing
/// moves it back except re-entering the view.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Remote<T> {
    #[default]
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Remote<T> {
    pub fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => Remote::Ready(value),
            Err(err) => Remote::Failed(err.to_string()),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Remote::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Remote::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Remote::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_collapse_to_their_message() {
        let state: Remote<u8> =
            Remote::from_result(Err(ApiError::Network("connection refused".into())));
        assert_eq!(state, Remote::Failed("connection refused".to_string()));
        assert!(state.ready().is_none());
    }

    #[test]
    fn starts_loading() {
        let state: Remote<Vec<u8>> = Remote::default();
        assert!(state.is_loading());
    }
}
