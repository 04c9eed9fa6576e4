//! Random IOU networks for stress testing and benchmarks.

use crate::core::iou::Iou;
use crate::core::user::UserId;
use log::warn;
use rand::Rng;
use uuid::Uuid;

/// Configuration for generating a random IOU network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Number of users in the network.
    pub user_count: usize,
    /// Exact number of IOUs to generate.
    pub iou_count: usize,
    /// Fraction of generated IOUs that are already claimed (0.0 to 1.0).
    pub claimed_ratio: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            user_count: 10,
            iou_count: 30,
            claimed_ratio: 0.0,
        }
    }
}

/// Generate a random set of IOUs between `user-NNN` users.
///
/// Giver and receiver always differ. Fewer than two users yields no IOUs.
pub fn generate_random_network(config: &NetworkConfig) -> Vec<Iou> {
    let mut rng = rand::thread_rng();
    if config.user_count < 2 {
        return Vec::new();
    }

    let users: Vec<UserId> = (0..config.user_count)
        .map(|i| UserId::new(format!("user-{:03}", i)))
        .collect();
    let claimed_ratio = if config.claimed_ratio.is_nan() {
        0.0
    } else {
        config.claimed_ratio.clamp(0.0, 1.0)
    };
    let mut ious = Vec::with_capacity(config.iou_count);
    for _ in 0..config.iou_count {
        let giver_idx = rng.gen_range(0..users.len());
        let mut receiver_idx = rng.gen_range(0..users.len());
        while receiver_idx == giver_idx {
            receiver_idx = rng.gen_range(0..users.len());
        }

        let mut iou = Iou::owe(
            users[giver_idx].clone(),
            Some(users[receiver_idx].clone()),
            Uuid::new_v4(),
        );
        if rng.gen_bool(claimed_ratio) {
            if let Err(err) = iou.claim(None) {
                warn!("generated IOU {} left unsettled: {}", iou.id(), err);
            }
        }
        ious.push(iou);
    }
    ious
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::debt_graph::DebtGraph;

    #[test]
    fn test_random_network_generation() {
        let config = NetworkConfig {
            user_count: 5,
            iou_count: 15,
            ..Default::default()
        };
        let ious = generate_random_network(&config);
        assert_eq!(ious.len(), 15);
        assert!(ious.iter().all(|iou| Some(iou.giver()) != iou.receiver()));
        assert!(ious.iter().all(|iou| !iou.is_claimed()));
    }

    #[test]
    fn test_all_claimed_builds_empty_graph() {
        let config = NetworkConfig {
            user_count: 8,
            iou_count: 32,
            claimed_ratio: 1.0,
        };
        let ious = generate_random_network(&config);
        assert!(ious.iter().all(Iou::is_claimed));
        assert!(DebtGraph::from_ious(&ious).is_empty());
    }

    #[test]
    fn test_iou_count_is_exact() {
        // not a multiple of the user count
        for iou_count in [0, 5, 29] {
            let config = NetworkConfig {
                user_count: 10,
                iou_count,
                ..Default::default()
            };
            assert_eq!(generate_random_network(&config).len(), iou_count);
        }
    }

    #[test]
    fn test_single_user_yields_nothing() {
        let config = NetworkConfig {
            user_count: 1,
            ..Default::default()
        };
        assert!(generate_random_network(&config).is_empty());
    }
}
