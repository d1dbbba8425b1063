//! Countdown example for the count timer

use count_timer::{
    CancellationToken, Duration, LifecycleEvent, NotifySpec, TimeSpec, TimeUnit, Timer,
    TimerEvent, TimerOptions,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let cancel_token = CancellationToken::new();

    // Count down five seconds, refreshing ten times a second
    let options = TimerOptions::count_down(TimeSpec::default().with_seconds(5))
        .with_update_interval(Duration::from_millis(100))
        .with_name("egg_timer");

    let (timer, mut handle) = Timer::with_options(options, 100, 100, cancel_token.clone())?;

    // Spawn the timer task
    let timer_task = tokio::spawn(timer.run());

    handle
        .notify_at(
            NotifySpec::before_end(TimeSpec::default().with_seconds(2)),
            |_, ms| println!("Two seconds to go ({} ms left)", ms),
        )
        .await?;
    handle
        .notify_at(NotifySpec::on(LifecycleEvent::Resume), |_, ms| {
            println!("Resumed with {} ms left", ms)
        })
        .await?;

    let mut last_second = None;
    handle
        .start(move |result| {
            if last_second != Some(result.seconds()) {
                last_second = Some(result.seconds());
                println!(
                    "{}:{}.{}",
                    result.padded(TimeUnit::Minutes, 2),
                    result.padded(TimeUnit::Seconds, 2),
                    result.padded(TimeUnit::Milliseconds, 3)
                );
            }
        })
        .await?;

    // Take a break in the middle
    tokio::time::sleep(Duration::from_millis(1500)).await;
    handle.suspend().await?;
    println!("Suspended: {:?}", handle.status().await?);

    tokio::time::sleep(Duration::from_secs(1)).await;
    handle.resume().await?;

    // Wait for the finish event
    while let Some(event) = handle.recv_event().await {
        println!("Event: {:?}", event);
        if let TimerEvent::Lifecycle {
            event: LifecycleEvent::Finish,
            ..
        } = event
        {
            break;
        }
    }

    // Shutdown gracefully
    handle.shutdown().await?;
    timer_task.await?;

    println!("Timer shut down successfully!");
    Ok(())
}
