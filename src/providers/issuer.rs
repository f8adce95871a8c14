use crate::model::ANONYMOUS_ISSUER;

/// Identity of whoever initiated the operation.
pub trait IssuerProvider: Send + Sync {
    fn current_issuer(&self) -> String;
}

impl<F> IssuerProvider for F
where
    F: Fn() -> String + Send + Sync,
{
    fn current_issuer(&self) -> String {
        self()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIssuerProvider;

impl IssuerProvider for AnonymousIssuerProvider {
    fn current_issuer(&self) -> String {
        ANONYMOUS_ISSUER.to_string()
    }
}
