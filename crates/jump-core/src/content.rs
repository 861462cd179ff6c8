use std::borrow::Cow;
use std::fmt;

use crate::layer::LayerId;

/// Identifies one drawable thing: a data layer, a server-backed layer, or a
/// fixed overlay such as the selection highlight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentId {
    Layer(LayerId),
    Wms(LayerId),
    Overlay(Cow<'static, str>),
}

impl ContentId {
    pub const fn overlay(name: &'static str) -> Self {
        ContentId::Overlay(Cow::Borrowed(name))
    }

    /// Server-backed content renders on the wide thread queue.
    pub fn is_server_backed(&self) -> bool {
        matches!(self, ContentId::Wms(_))
    }

    pub fn layer_id(&self) -> Option<LayerId> {
        match self {
            ContentId::Layer(id) | ContentId::Wms(id) => Some(*id),
            ContentId::Overlay(_) => None,
        }
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentId::Layer(id) => write!(f, "layer:{id}"),
            ContentId::Wms(id) => write!(f, "wms:{id}"),
            ContentId::Overlay(name) => write!(f, "overlay:{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_server_backed_predicate() {
        let id = Uuid::new_v4();
        assert!(ContentId::Wms(id).is_server_backed());
        assert!(!ContentId::Layer(id).is_server_backed());
        assert!(!ContentId::overlay("SELECTION_BACKGROUND").is_server_backed());
        assert_ne!(ContentId::Wms(id), ContentId::Layer(id));
    }

    #[test]
    fn test_overlay_equality_ignores_cow_variant() {
        let borrowed = ContentId::overlay("GRID");
        let owned = ContentId::Overlay(Cow::Owned("GRID".to_string()));
        assert_eq!(borrowed, owned);
        assert_eq!(owned.to_string(), "overlay:GRID");
    }
}
