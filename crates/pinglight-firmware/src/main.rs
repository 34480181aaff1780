#![no_std]
#![no_main]
#![feature(type_alias_impl_trait)]

extern crate alloc;

mod infrastructure;

use embassy_executor::Spawner;
use embassy_time::Duration;

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{clock::CpuClock, timer::timg::TimerGroup};
use log::{error, info, warn};
use pinglight_strip::probe::probe_targets;
use pinglight_strip::{HardwareClaims, NetworkReadiness, SharedStrip};

use crate::infrastructure::config;
use crate::infrastructure::drivers::{RmtPulseChannel, init_network_stack};
use crate::infrastructure::tasks::{
    network_monitor_task, network_runner_task, probe_task, wifi_connection_task,
};
use crate::infrastructure::types::Strip;

esp_bootloader_esp_idf::esp_app_desc!();

static HARDWARE_CLAIMS: HardwareClaims = HardwareClaims::new();

// static_cell::make_static! in main causes a compiler error
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write(($val));
        x
    }};
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    esp_println::logger::init_logger_from_env();
    info!(
        "pinglight {} built {}",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME")
    );

    // Initialize hardware
    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    // Allocate heap memory (64 + 32 KB)
    esp_alloc::heap_allocator!(
        #[unsafe(link_section = ".dram2_uninit")] size: 64 * 1024
    );
    esp_alloc::heap_allocator!(size: 32 * 1024);

    // Start rtos
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // Initialize network stack and spawn network tasks
    let readiness: &'static NetworkReadiness =
        mk_static!(NetworkReadiness, NetworkReadiness::new());
    let (stack, runner, controller) = init_network_stack(peripherals.WIFI);
    spawner.spawn(wifi_connection_task(controller)).ok();
    spawner.spawn(network_runner_task(runner)).ok();
    spawner.spawn(network_monitor_task(stack, readiness)).ok();

    // Probes need at least one address family
    let state = readiness
        .wait_any()
        .await
        .expect("readiness waiter slots exhausted");
    info!("network: ready (ipv4: {}, ipv6: {})", state.ipv4, state.ipv6);

    // Bring the strip up dark
    let channel = RmtPulseChannel::new(peripherals.RMT, led_gpio!(peripherals))
        .expect("rmt channel setup failed");
    let strip: &'static Strip = mk_static!(
        Strip,
        SharedStrip::bring_up(&HARDWARE_CLAIMS, config::STRIP, channel)
            .expect("strip bring-up failed")
    );
    if let Err(e) = strip.push().await {
        warn!("strip: initial push failed: {}", e);
    }

    for target in probe_targets(&config::TARGET_HOSTS) {
        if let Err(e) = spawner.spawn(probe_task(stack, strip, readiness, target)) {
            error!("probe: cannot spawn task for {}: {:?}", target.host, e);
        }
    }

    loop {
        embassy_time::Timer::after(Duration::from_secs(5)).await;
    }
}
