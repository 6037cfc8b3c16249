//! Property-based tests for trellis-events using proptest.

use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use trellis_events::{Events, Listening};

proptest! {
    /// Listeners fire in registration order, and only for their exact name.
    #[test]
    fn trigger_fires_matching_in_order(names in prop::collection::vec(0u8..4, 1..30), fired in 0u8..4) {
        let bus: Events<u8> = Events::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (i, name) in names.iter().enumerate() {
            let log = log.clone();
            bus.on(format!("e{}", name), move |_| log.borrow_mut().push(i));
        }

        let invoked = bus.trigger(&format!("e{}", fired), &[]);
        let expected: Vec<usize> = names
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n == fired)
            .map(|(i, _)| i)
            .collect();

        prop_assert_eq!(invoked, expected.len());
        prop_assert_eq!(&*log.borrow(), &expected);
    }

    /// After removing any subset, only the survivors fire.
    #[test]
    fn off_removes_exactly_the_given_listeners(remove in prop::collection::vec(any::<bool>(), 1..30)) {
        let bus: Events<()> = Events::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let ids: Vec<_> = (0..remove.len())
            .map(|i| {
                let log = log.clone();
                bus.on("tick", move |_| log.borrow_mut().push(i))
            })
            .collect();

        for (id, &gone) in ids.iter().zip(remove.iter()) {
            if gone {
                prop_assert!(bus.off(*id));
            }
        }

        bus.trigger("tick", &[]);
        let expected: Vec<usize> = remove
            .iter()
            .enumerate()
            .filter(|&(_, &gone)| !gone)
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(&*log.borrow(), &expected);
        prop_assert_eq!(bus.len(), expected.len());
    }

    /// stop_listening detaches every subscription across every source.
    #[test]
    fn stop_listening_clears_all_sources(counts in prop::collection::vec(0usize..5, 1..8)) {
        let sources: Vec<Events<()>> = counts.iter().map(|_| Events::new()).collect();
        let listening: Listening<()> = Listening::new();

        for (source, &count) in sources.iter().zip(counts.iter()) {
            for _ in 0..count {
                listening.listen_to(source, "ping", |_| {});
            }
        }

        prop_assert_eq!(listening.stop_listening(), counts.iter().sum::<usize>());
        prop_assert!(sources.iter().all(Events::is_empty));
    }
}
