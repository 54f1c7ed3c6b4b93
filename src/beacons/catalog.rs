use super::types::Region;

/// Beacon regions most recently fetched from the backend. Memory only.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    regions: Vec<Region>,
}

impl RegionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, regions: Vec<Region>) {
        self.regions = regions;
    }

    /// Resolve a radio identifier back to its region
    pub fn lookup(&self, identifier: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.identifier() == identifier)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(id: i64, uuid: &str) -> Region {
        Region {
            id,
            uuid: uuid.to_string(),
            major: None,
        }
    }

    #[test]
    fn test_lookup_by_identifier() {
        let mut catalog = RegionCatalog::new();
        assert!(catalog.lookup("U1").is_none());

        catalog.replace(vec![region(1, "U1"), region(2, "U2")]);
        assert_eq!(catalog.lookup("U2").map(|r| r.id), Some(2));
        assert!(catalog.lookup("U3").is_none());
    }

    #[test]
    fn test_replace_drops_old_regions() {
        let mut catalog = RegionCatalog::new();
        catalog.replace(vec![region(1, "U1")]);
        catalog.replace(vec![region(9, "U9")]);
        assert!(catalog.lookup("U1").is_none());
        assert_eq!(catalog.regions().len(), 1);
    }
}
