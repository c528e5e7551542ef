use crate::config::AssetConfig;
use crate::content::ContentRegistry;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Background,
    ItemSprite,
}

impl AssetKind {
    fn directory(self) -> &'static str {
        match self {
            AssetKind::Background => "backgrounds",
            AssetKind::ItemSprite => "items",
        }
    }
}

/// One image to fetch, and the key later draw calls use to find it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub key: String,
    pub kind: AssetKind,
    pub path: String,
}

/// Every image the scene may draw, one request per key
///
/// ELI5: 205 items share a handful of sprites, so the plan is much shorter
/// than the registry :
/// ┌────────────────────┬──────────┬──────────────┐
/// │ Source             │ Entries  │ Requests     │
/// ├────────────────────┼──────────┼──────────────┤
/// │ rooms              │ 4        │ 4            │
/// │ authored items     │ 5        │ 5            │
/// │ generated items    │ 200      │ 1 (generic)  │
/// └────────────────────┴──────────┴──────────────┘
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreloadPlan {
    requests: Vec<LoadRequest>,
}

impl PreloadPlan {
    /// Backgrounds first, then sprites, both in registry order. A key seen
    /// twice keeps its first request.
    pub fn from_registry(registry: &ContentRegistry, assets: &AssetConfig) -> Self {
        let backgrounds = registry
            .rooms()
            .iter()
            .map(|room| (room.background.as_str(), AssetKind::Background));
        let sprites = registry
            .items()
            .iter()
            .map(|item| (item.sprite.as_str(), AssetKind::ItemSprite));

        backgrounds
            .chain(sprites)
            .map(|(key, kind)| LoadRequest {
                key: key.to_string(),
                kind,
                path: asset_path(assets, kind, key),
            })
            .collect()
    }

    pub fn requests(&self) -> &[LoadRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.requests.iter().any(|request| request.key == key)
    }
}

/// Requests whose paths do not follow `asset_path` (data URIs, CDNs with
/// hashed names). Same rule : first request per key wins.
impl FromIterator<LoadRequest> for PreloadPlan {
    fn from_iter<I: IntoIterator<Item = LoadRequest>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let requests = iter
            .into_iter()
            .filter(|request| seen.insert(request.key.clone()))
            .collect();
        PreloadPlan { requests }
    }
}

/// `<root>/<backgrounds|items>/<key>.<ext>`
pub fn asset_path(assets: &AssetConfig, kind: AssetKind, key: &str) -> String {
    format!(
        "{}/{}/{}.{}",
        assets.root.trim_end_matches('/'),
        kind.directory(),
        key,
        assets.image_extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::registry;

    fn plan() -> PreloadPlan {
        PreloadPlan::from_registry(registry().unwrap(), &AssetConfig::default())
    }

    fn count(plan: &PreloadPlan, key: &str) -> usize {
        plan.requests().iter().filter(|r| r.key == key).count()
    }

    #[test]
    fn every_background_is_requested_once() {
        let plan = plan();
        for room in registry().unwrap().rooms() {
            assert_eq!(count(&plan, &room.background), 1, "{}", room.background);
        }
        assert_eq!(
            plan.requests()[0].path,
            "/assets/backgrounds/cabin-optimized.webp"
        );
        assert_eq!(plan.requests()[0].kind, AssetKind::Background);
    }

    #[test]
    fn every_sprite_is_requested_once() {
        let plan = plan();
        for item in registry().unwrap().items() {
            assert_eq!(count(&plan, &item.sprite), 1, "{}", item.sprite);
        }
        let generic = plan
            .requests()
            .iter()
            .find(|r| r.key == "generic-optimized")
            .unwrap();
        assert_eq!(generic.path, "/assets/items/generic-optimized.webp");
        assert_eq!(generic.kind, AssetKind::ItemSprite);
    }

    #[test]
    fn shared_sprites_collapse_into_one_request() {
        // 4 backgrounds + 5 authored sprites + 1 generic
        assert_eq!(plan().len(), 10);
    }

    #[test]
    fn explicit_requests_keep_the_first_per_key() {
        let request = |key: &str, path: &str| LoadRequest {
            key: key.to_string(),
            kind: AssetKind::Background,
            path: path.to_string(),
        };
        let plan: PreloadPlan = [
            request("attic", "data:image/gif;base64,AAAA"),
            request("attic", "/elsewhere.gif"),
            request("cellar", "/cellar.gif"),
        ]
        .into_iter()
        .collect();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.requests()[0].path, "data:image/gif;base64,AAAA");
        assert!(plan.contains("cellar"));
    }

    #[test]
    fn paths_follow_asset_config() {
        let assets = AssetConfig {
            root: "https://cdn.example.com/game/".to_string(),
            image_extension: "png".to_string(),
        };
        assert_eq!(
            asset_path(&assets, AssetKind::ItemSprite, "key-optimized"),
            "https://cdn.example.com/game/items/key-optimized.png"
        );
    }
}
