use futuretd_engine::Rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ServerCommand {
    BuildTower {
        tile_x: i32,
        tile_y: i32,
        tower_type_id: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TowerType {
    Laser,
    Cannon,
    Frost,
}

impl TowerType {
    pub(crate) const ALL: [TowerType; 3] = [TowerType::Laser, TowerType::Cannon, TowerType::Frost];

    pub(crate) fn from_id(id: u32) -> Option<TowerType> {
        match id {
            0 => Some(TowerType::Laser),
            1 => Some(TowerType::Cannon),
            2 => Some(TowerType::Frost),
            _ => None,
        }
    }

    pub(crate) fn id(self) -> u32 {
        match self {
            TowerType::Laser => 0,
            TowerType::Cannon => 1,
            TowerType::Frost => 2,
        }
    }

    pub(crate) fn color(self) -> Rgba {
        match self {
            TowerType::Laser => [220, 40, 60, 255],
            TowerType::Cannon => [70, 70, 80, 255],
            TowerType::Frost => [90, 180, 240, 255],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_map_back_to_tower_types() {
        for tower in TowerType::ALL {
            assert_eq!(TowerType::from_id(tower.id()), Some(tower));
        }
        assert_eq!(TowerType::from_id(3), None);
    }
}
