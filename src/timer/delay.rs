use crate::sonde::Sonde;
use crate::source::ByteSource;
use crate::timer::Clock;
use crate::transport::Transport;
use embedded_hal::delay::DelayNs;

/// Runs the sonde forever, pausing `period_us` between cycles.
///
/// Cycle errors are already counted in [`Sonde::stats`] and never stop the
/// loop. Call [`Sonde::initialize`] first.
///
/// # Example
/// ```rust,ignore
/// use lorasonde::timer::run_poll_loop;
///
/// sonde.initialize(&LinkConfig::default())?;
/// run_poll_loop(&mut sonde, &mut delay, 1_000);
/// ```
///
/// # Notes
/// - Each cycle already blocks for up to one read window per feed while a
///   record is in progress, so a short `period_us` is enough.
/// - For firmware that has other work to do, call [`Sonde::poll`] from your
///   own loop instead.
pub fn run_poll_loop<I, A, T, C, D>(sonde: &mut Sonde<I, A, T, C>, delay: &mut D, period_us: u32) -> !
where
    I: ByteSource,
    A: ByteSource,
    T: Transport,
    C: Clock,
    D: DelayNs,
{
    loop {
        let _ = sonde.poll();
        delay.delay_us(period_us);
    }
}
