use crate::model::InvocationInfo;

/// Source of invocation metadata. Reads only; no side effects.
pub trait InvocationInfoProvider: Send + Sync {
    fn current(&self) -> InvocationInfo;
}

impl<F> InvocationInfoProvider for F
where
    F: Fn() -> InvocationInfo + Send + Sync,
{
    fn current(&self) -> InvocationInfo {
        self()
    }
}

/// Used when no integration supplies metadata: `Unknown*` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInvocationInfoProvider;

impl InvocationInfoProvider for DefaultInvocationInfoProvider {
    fn current(&self) -> InvocationInfo {
        InvocationInfo::default()
    }
}
