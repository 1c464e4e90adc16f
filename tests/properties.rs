//! Property tests for placement, attachment and provisioning.

use ltecomp::attachment::{AttachmentMode, attach};
use ltecomp::provisioning::{FlowRole, provision};
use ltecomp::topology::{TopologyParams, cell_positions, generate_topology};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

const EPS: f64 = 1e-9;

proptest! {
    #[test]
    fn cells_form_square_inside_bounds(enb_dist in 0.1f64..10_000.0) {
        let cells = cell_positions(enb_dist);
        let side = 2.0 * enb_dist;

        for c in &cells {
            prop_assert!(c.x >= -EPS && c.x <= side + EPS);
            prop_assert!(c.y >= -EPS && c.y <= side + EPS);
        }
        // adjacent sites are enb_dist apart, diagonal ones enb_dist * sqrt(2)
        let d01 = cells[0].distance_to(&cells[1]);
        let d02 = cells[0].distance_to(&cells[2]);
        let d03 = cells[0].distance_to(&cells[3]);
        prop_assert!((d01 - enb_dist).abs() < 1e-6 * enb_dist.max(1.0));
        prop_assert!((d02 - enb_dist).abs() < 1e-6 * enb_dist.max(1.0));
        prop_assert!((d03 - enb_dist * 2f64.sqrt()).abs() < 1e-6 * enb_dist.max(1.0));
    }

    #[test]
    fn terminals_stay_in_disc(
        enb_dist in 1.0f64..1_000.0,
        radius in 0.0f64..500.0,
        num_ues in 0usize..30,
        seed in any::<u64>(),
    ) {
        let params = TopologyParams::new(enb_dist, radius, num_ues);
        let topo = generate_topology(&params, &mut StdRng::seed_from_u64(seed));
        let center = params.disc_center();

        prop_assert_eq!(topo.terminal_count(), 4 * num_ues);
        for t in topo.terminals() {
            prop_assert!(t.position.distance_to(&center) <= radius + 1e-6);
        }
    }

    #[test]
    fn same_seed_same_topology(seed in any::<u64>(), num_ues in 0usize..20) {
        let params = TopologyParams::new(100.0, 50.0, num_ues);
        let a = generate_topology(&params, &mut StdRng::seed_from_u64(seed));
        let b = generate_topology(&params, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn static_mode_is_identity(seed in any::<u64>(), num_ues in 0usize..20) {
        let topo = generate_topology(&TopologyParams::new(100.0, 50.0, num_ues), &mut StdRng::seed_from_u64(seed));
        let records = attach(&topo.groups, &topo.cells, AttachmentMode::Static);

        prop_assert_eq!(records.len(), topo.terminal_count());
        for r in &records {
            prop_assert_eq!(r.cell.0, r.terminal.group);
        }
    }

    #[test]
    fn nearest_mode_never_picks_a_farther_cell(
        seed in any::<u64>(),
        enb_dist in 1.0f64..1_000.0,
        radius in 0.0f64..1_000.0,
    ) {
        let topo = generate_topology(&TopologyParams::new(enb_dist, radius, 15), &mut StdRng::seed_from_u64(seed));
        let records = attach(&topo.groups, &topo.cells, AttachmentMode::Nearest);

        prop_assert_eq!(records.len(), topo.terminal_count());
        for r in &records {
            let t = topo.terminal(r.terminal).unwrap();
            let chosen = t.position.distance_to(&topo.cells[r.cell.0].position);
            for (i, cell) in topo.cells.iter().enumerate() {
                let d = t.position.distance_to(&cell.position);
                prop_assert!(chosen <= d);
                if i < r.cell.0 {
                    // lower index only loses when strictly farther
                    prop_assert!(d > chosen);
                }
            }
        }
    }

    #[test]
    fn only_best_effort_is_default(role in 0usize..64) {
        let bearer = provision(role);
        if FlowRole::from_index(role) == FlowRole::BestEffort {
            prop_assert!(bearer.tft.is_default());
        } else {
            prop_assert!(!bearer.tft.filters().is_empty());
        }
    }
}
