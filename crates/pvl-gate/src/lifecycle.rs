use pvl_types::BatchStatus;

use crate::denial::Denial;

/// Check that `requested` is the immediate successor of `current`.
///
/// Applies to every role: a terminal batch reports `TerminalState`, anything
/// other than the next status reports `OutOfOrder`.
pub fn check_step(current: BatchStatus, requested: BatchStatus) -> Result<(), Denial> {
    match current.successor() {
        None => Err(Denial::TerminalState { status: current }),
        Some(next) if next == requested => Ok(()),
        Some(_) => Err(Denial::OutOfOrder {
            from: current,
            to: requested,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_successor_is_legal() {
        assert!(check_step(BatchStatus::Harvested, BatchStatus::InTransit).is_ok());
        assert!(check_step(BatchStatus::InTransit, BatchStatus::Delivered).is_ok());
        assert!(check_step(BatchStatus::Delivered, BatchStatus::Verified).is_ok());
    }

    #[test]
    fn skips_backwards_and_repeats_are_out_of_order() {
        for (from, to) in [
            (BatchStatus::Harvested, BatchStatus::Delivered),
            (BatchStatus::Harvested, BatchStatus::Verified),
            (BatchStatus::Delivered, BatchStatus::InTransit),
            (BatchStatus::InTransit, BatchStatus::InTransit),
        ] {
            assert_eq!(check_step(from, to), Err(Denial::OutOfOrder { from, to }));
        }
    }

    #[test]
    fn verified_is_terminal() {
        for to in BatchStatus::ALL {
            assert_eq!(
                check_step(BatchStatus::Verified, to),
                Err(Denial::TerminalState {
                    status: BatchStatus::Verified
                })
            );
        }
    }
}
