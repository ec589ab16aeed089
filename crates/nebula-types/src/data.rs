//! Static data tables: unit stats and cost curves.
//!
//! These are read-only lookups keyed by type. The engine never mutates
//! them; balancing changes are made here and nowhere else.

use crate::enums::{BuildingType, DefenseType, ShipType, TechnologyType};
use crate::resources::Resources;

// ---------------------------------------------------------------------------
// Ships
// ---------------------------------------------------------------------------

/// Combat and logistics stats for one ship type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipStats {
    /// Build cost per unit.
    pub cost: Resources,
    /// Weapon damage per round.
    pub attack: u64,
    /// Shield points, regenerated every round.
    pub shield: u64,
    /// Hull points.
    pub armor: u64,
    /// Cargo capacity.
    pub cargo: u64,
    /// Base speed.
    pub speed: u64,
    /// Base deuterium consumption per flight.
    pub fuel: u64,
}

/// Look up the stats for a ship type.
pub const fn ship_stats(ship: ShipType) -> ShipStats {
    match ship {
        ShipType::LightFighter => ShipStats {
            cost: Resources::new(3_000, 1_000, 0),
            attack: 50,
            shield: 10,
            armor: 400,
            cargo: 50,
            speed: 12_500,
            fuel: 20,
        },
        ShipType::HeavyFighter => ShipStats {
            cost: Resources::new(6_000, 4_000, 0),
            attack: 150,
            shield: 25,
            armor: 1_000,
            cargo: 100,
            speed: 10_000,
            fuel: 75,
        },
        ShipType::Cruiser => ShipStats {
            cost: Resources::new(20_000, 7_000, 2_000),
            attack: 400,
            shield: 50,
            armor: 2_700,
            cargo: 800,
            speed: 15_000,
            fuel: 300,
        },
        ShipType::Battleship => ShipStats {
            cost: Resources::new(45_000, 15_000, 0),
            attack: 1_000,
            shield: 200,
            armor: 6_000,
            cargo: 1_500,
            speed: 10_000,
            fuel: 500,
        },
        ShipType::SmallCargo => ShipStats {
            cost: Resources::new(2_000, 2_000, 0),
            attack: 5,
            shield: 10,
            armor: 400,
            cargo: 5_000,
            speed: 5_000,
            fuel: 10,
        },
        ShipType::LargeCargo => ShipStats {
            cost: Resources::new(6_000, 6_000, 0),
            attack: 5,
            shield: 25,
            armor: 1_200,
            cargo: 25_000,
            speed: 7_500,
            fuel: 50,
        },
        ShipType::ColonyShip => ShipStats {
            cost: Resources::new(10_000, 20_000, 10_000),
            attack: 50,
            shield: 100,
            armor: 3_000,
            cargo: 7_500,
            speed: 2_500,
            fuel: 1_000,
        },
        ShipType::Recycler => ShipStats {
            cost: Resources::new(10_000, 6_000, 2_000),
            attack: 1,
            shield: 10,
            armor: 1_600,
            cargo: 20_000,
            speed: 2_000,
            fuel: 300,
        },
        ShipType::EspionageProbe => ShipStats {
            cost: Resources::new(0, 1_000, 0),
            attack: 0,
            shield: 0,
            armor: 100,
            cargo: 5,
            speed: 100_000_000,
            fuel: 1,
        },
        ShipType::DarkMatterHarvester => ShipStats {
            cost: Resources::new(100_000, 150_000, 50_000),
            attack: 10,
            shield: 50,
            armor: 2_000,
            cargo: 1_000,
            speed: 5_000,
            fuel: 500,
        },
        ShipType::Deathstar => ShipStats {
            cost: Resources::new(5_000_000, 4_000_000, 1_000_000),
            attack: 200_000,
            shield: 50_000,
            armor: 900_000,
            cargo: 1_000_000,
            speed: 100,
            fuel: 1,
        },
    }
}

// ---------------------------------------------------------------------------
// Defenses
// ---------------------------------------------------------------------------

/// Combat stats for one defense type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefenseStats {
    /// Build cost per unit.
    pub cost: Resources,
    /// Weapon damage per round.
    pub attack: u64,
    /// Shield points, regenerated every round.
    pub shield: u64,
    /// Hull points.
    pub armor: u64,
}

/// Look up the stats for a defense type.
pub const fn defense_stats(defense: DefenseType) -> DefenseStats {
    match defense {
        DefenseType::RocketLauncher => DefenseStats {
            cost: Resources::new(2_000, 0, 0),
            attack: 80,
            shield: 20,
            armor: 200,
        },
        DefenseType::LightLaser => DefenseStats {
            cost: Resources::new(1_500, 500, 0),
            attack: 100,
            shield: 25,
            armor: 200,
        },
        DefenseType::HeavyLaser => DefenseStats {
            cost: Resources::new(6_000, 2_000, 0),
            attack: 250,
            shield: 100,
            armor: 800,
        },
        DefenseType::GaussCannon => DefenseStats {
            cost: Resources::new(20_000, 15_000, 2_000),
            attack: 1_100,
            shield: 200,
            armor: 3_500,
        },
        DefenseType::IonCannon => DefenseStats {
            cost: Resources::new(2_000, 6_000, 0),
            attack: 150,
            shield: 500,
            armor: 800,
        },
        DefenseType::PlasmaTurret => DefenseStats {
            cost: Resources::new(50_000, 50_000, 30_000),
            attack: 3_000,
            shield: 300,
            armor: 10_000,
        },
        DefenseType::SmallShieldDome => DefenseStats {
            cost: Resources::new(10_000, 10_000, 0),
            attack: 1,
            shield: 2_000,
            armor: 2_000,
        },
        DefenseType::LargeShieldDome => DefenseStats {
            cost: Resources::new(50_000, 50_000, 0),
            attack: 1,
            shield: 10_000,
            armor: 10_000,
        },
        DefenseType::PlanetaryShield => DefenseStats {
            cost: Resources::new(2_000_000, 2_000_000, 1_000_000),
            attack: 1,
            shield: 100_000,
            armor: 100_000,
        },
    }
}

// ---------------------------------------------------------------------------
// Cost curves
// ---------------------------------------------------------------------------

/// Level-1 cost and per-level growth factor for a building or technology.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostCurve {
    /// Cost of level 1.
    pub base_cost: Resources,
    /// Cost multiplier applied per additional level.
    pub multiplier: f64,
}

/// Cost curve for a building.
pub const fn building_curve(building: BuildingType) -> CostCurve {
    let (base_cost, multiplier) = match building {
        BuildingType::MetalMine => (Resources::new(60, 15, 0), 1.5),
        BuildingType::CrystalMine => (Resources::new(48, 24, 0), 1.6),
        BuildingType::DeuteriumSynthesizer => (Resources::new(225, 75, 0), 1.5),
        BuildingType::SolarPlant => (Resources::new(75, 30, 0), 1.5),
        BuildingType::FusionReactor => (Resources::new(900, 360, 180), 1.8),
        BuildingType::RoboticsFactory => (Resources::new(400, 120, 200), 2.0),
        BuildingType::NaniteFactory => (Resources::new(1_000_000, 500_000, 100_000), 2.0),
        BuildingType::Shipyard => (Resources::new(400, 200, 100), 2.0),
        BuildingType::ResearchLab => (Resources::new(200, 400, 200), 2.0),
        BuildingType::MetalStorage => (Resources::new(1_000, 0, 0), 2.0),
        BuildingType::CrystalStorage => (Resources::new(1_000, 500, 0), 2.0),
        BuildingType::DeuteriumTank => (Resources::new(1_000, 1_000, 0), 2.0),
        BuildingType::DarkMatterCollector => (Resources::new(50_000, 100_000, 50_000), 2.0),
        BuildingType::Terraformer => (Resources::new(0, 50_000, 100_000), 2.0),
        BuildingType::LunarBase | BuildingType::SensorPhalanx => {
            (Resources::new(20_000, 40_000, 20_000), 2.0)
        }
        BuildingType::JumpGate => (Resources::new(2_000_000, 4_000_000, 2_000_000), 2.0),
    };
    CostCurve {
        base_cost,
        multiplier,
    }
}

/// Cost curve for a technology.
pub const fn technology_curve(tech: TechnologyType) -> CostCurve {
    let (base_cost, multiplier) = match tech {
        TechnologyType::EnergyTechnology => (Resources::new(0, 800, 400), 2.0),
        TechnologyType::LaserTechnology => (Resources::new(200, 100, 0), 2.0),
        TechnologyType::IonTechnology => (Resources::new(1_000, 300, 100), 2.0),
        TechnologyType::HyperspaceTechnology => (Resources::new(0, 4_000, 2_000), 2.0),
        TechnologyType::PlasmaTechnology => (Resources::new(2_000, 4_000, 1_000), 2.0),
        TechnologyType::ComputerTechnology => (Resources::new(0, 400, 600), 2.0),
        TechnologyType::EspionageTechnology => (Resources::new(200, 1_000, 200), 2.0),
        TechnologyType::CombustionDrive => (Resources::new(400, 0, 600), 2.0),
        TechnologyType::ImpulseDrive => (Resources::new(2_000, 4_000, 600), 2.0),
        TechnologyType::HyperspaceDrive => (Resources::new(10_000, 20_000, 6_000), 2.0),
        TechnologyType::WeaponsTechnology => (Resources::new(800, 200, 0), 2.0),
        TechnologyType::ShieldingTechnology => (Resources::new(200, 600, 0), 2.0),
        TechnologyType::ArmourTechnology => (Resources::new(1_000, 0, 0), 2.0),
        TechnologyType::Astrophysics => (Resources::new(4_000, 8_000, 4_000), 1.75),
        TechnologyType::DarkMatterTechnology => (Resources::new(100_000, 200_000, 100_000), 2.0),
        TechnologyType::MineralResearch => (Resources::new(1_000, 500, 0), 2.0),
        TechnologyType::CrystalResearch => (Resources::new(500, 1_000, 0), 2.0),
        TechnologyType::FuelResearch => (Resources::new(500, 500, 500), 2.0),
    };
    CostCurve {
        base_cost,
        multiplier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_ship_has_hull() {
        for ship in ShipType::ALL {
            assert!(ship_stats(ship).armor > 0, "{ship:?} has no hull");
        }
    }

    #[test]
    fn recycler_holds_twenty_thousand() {
        assert_eq!(ship_stats(ShipType::Recycler).cargo, 20_000);
    }

    #[test]
    fn every_curve_grows() {
        for building in BuildingType::ALL {
            assert!(building_curve(building).multiplier > 1.0);
        }
        for tech in TechnologyType::ALL {
            assert!(technology_curve(tech).multiplier > 1.0);
        }
    }
}
