use std::fmt;
use std::sync::Arc;

use mapping_cache::MappingProvider;
use mapping_compose::{ContributorId, FragmentTransform};

/// One entry of the contributor list, before any data is fetched.
#[derive(Clone)]
pub enum ContributorSpec {
    /// Fetch the provider's fragment for each release and merge it.
    Add {
        id: ContributorId,
        provider: Arc<dyn MappingProvider>,
    },
    /// Transform an earlier contributor's fragment and merge it here.
    Wrap {
        id: ContributorId,
        inner: ContributorId,
        transform: Arc<dyn FragmentTransform>,
    },
}

impl ContributorSpec {
    pub fn add(id: impl Into<ContributorId>, provider: Arc<dyn MappingProvider>) -> Self {
        Self::Add {
            id: id.into(),
            provider,
        }
    }

    pub fn wrap(
        id: impl Into<ContributorId>,
        inner: impl Into<ContributorId>,
        transform: Arc<dyn FragmentTransform>,
    ) -> Self {
        Self::Wrap {
            id: id.into(),
            inner: inner.into(),
            transform,
        }
    }

    pub fn id(&self) -> &ContributorId {
        match self {
            Self::Add { id, .. } | Self::Wrap { id, .. } => id,
        }
    }
}

impl fmt::Debug for ContributorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add { id, provider } => f
                .debug_struct("Add")
                .field("id", id)
                .field("provider", &provider.id())
                .finish(),
            Self::Wrap {
                id,
                inner,
                transform,
            } => f
                .debug_struct("Wrap")
                .field("id", id)
                .field("inner", inner)
                .field("transform", &transform.name())
                .finish(),
        }
    }
}
