#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

#[cfg(target_os = "none")]
mod firmware {
    use core::cell::RefCell;
    use core::future::pending;

    use agribot_firmware::config::SERIAL_BAUD_RATE;
    use agribot_firmware::dispatcher::Dispatcher;
    use agribot_firmware::hal::esp::EspClock;
    use agribot_firmware::hal::MemoryStore;
    use agribot_firmware::robot::avoidance::ObstacleAvoidance;
    use agribot_firmware::robot::buzzer::Buzzer;
    use agribot_firmware::robot::drive::Drive;
    use agribot_firmware::robot::encoder::{Encoder, PulseCounter};
    use agribot_firmware::robot::hbridge::HBridge;
    use agribot_firmware::robot::motor_y::MotorY;
    use agribot_firmware::robot::motor_z::MotorZ;
    use agribot_firmware::robot::pin_config::PinConfig;
    use agribot_firmware::robot::pump::Pump;
    use agribot_firmware::robot::ultrasonic::UltrasonicArray;
    use agribot_firmware::tasks::control_task::control_task;
    use agribot_firmware::tasks::serial_task::{serial_task, CommandLine};
    use agribot_firmware::LINE_CHANNEL_SIZE;
    use critical_section::Mutex;
    use embassy_executor::Spawner;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::channel::Channel as SyncChannel;
    use esp_backtrace as _;
    use esp_hal::clock::CpuClock;
    use esp_hal::gpio::{
        AnyPin, Event, Input, InputConfig, Io, Level, Output, OutputConfig, Pin, Pull,
    };
    use esp_hal::ledc::channel::{self, Channel, ChannelIFace, Number};
    use esp_hal::ledc::timer::{self, LSClockSource, TimerIFace};
    use esp_hal::ledc::{LSGlobalClkSource, Ledc, LowSpeed};
    use esp_hal::time::Rate;
    use esp_hal::timer::timg::TimerGroup;
    use esp_hal::uart::{self, Uart};
    use log::info;

    esp_bootloader_esp_idf::esp_app_desc!();

    macro_rules! mk_static {
        ($t:ty, $val:expr) => {{
            static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
            STATIC_CELL.init_with(|| $val)
        }};
    }

    /// Z-axis quadrature counter, shared with the GPIO edge handler.
    static Z_PULSES: PulseCounter = PulseCounter::new();
    /// Encoder input pins, parked where the interrupt handler can reach them.
    static ENCODER_PINS: Mutex<RefCell<Option<(Input<'static>, Input<'static>)>>> =
        Mutex::new(RefCell::new(None));

    #[esp_hal::handler]
    fn on_encoder_edge() {
        critical_section::with(|cs| {
            if let Some((a, b)) = ENCODER_PINS.borrow_ref_mut(cs).as_mut() {
                a.clear_interrupt();
                Z_PULSES.on_edge(a.is_high(), b.is_high());
            }
        });
    }

    #[esp_hal_embassy::main]
    async fn main(spawner: Spawner) {
        esp_println::logger::init_logger_from_env();

        let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
        let p = esp_hal::init(config);

        let timer0 = TimerGroup::new(p.TIMG1);
        esp_hal_embassy::init(timer0.timer0);
        info!("Embassy initialized");

        // Serial link to the host controller (UART0, the USB console pins).
        let uart = Uart::new(
            p.UART0,
            uart::Config::default().with_baudrate(SERIAL_BAUD_RATE),
        )
        .expect("Fail configuring UART0")
        .with_tx(p.GPIO1)
        .with_rx(p.GPIO3)
        .into_async();
        let (uart_rx, uart_tx) = uart.split();

        // Quadrature encoder inputs, edge interrupt on channel A.
        let mut io = Io::new(p.IO_MUX);
        io.set_interrupt_handler(on_encoder_edge);
        let pull_up = InputConfig::default().with_pull(Pull::Up);
        let mut encoder_a = Input::new(p.GPIO35, pull_up);
        let encoder_b = Input::new(p.GPIO36, pull_up);
        encoder_a.listen(Event::AnyEdge);
        critical_section::with(|cs| {
            ENCODER_PINS.borrow_ref_mut(cs).replace((encoder_a, encoder_b));
        });

        // Motor PWM: one LEDC low-speed channel per H-bridge pin.
        let ledc = mk_static!(Ledc<'static>, Ledc::new(p.LEDC));
        ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);
        let ledc_timer = {
            let mut t = ledc.timer::<LowSpeed>(timer::Number::Timer0);
            t.configure(timer::config::Config {
                duty: timer::config::Duty::Duty8Bit,
                clock_source: LSClockSource::APBClk,
                frequency: Rate::from_khz(1),
            })
            .expect("Fail configuring ledc timer");
            mk_static!(timer::Timer<'static, LowSpeed>, t)
        };

        // wheel left fwd/rev, wheel right fwd/rev, arm z fwd/rev, head y up/down
        let motor_pins: [AnyPin<'static>; 8] = [
            p.GPIO32.degrade(),
            p.GPIO33.degrade(),
            p.GPIO17.degrade(),
            p.GPIO16.degrade(),
            p.GPIO26.degrade(),
            p.GPIO27.degrade(),
            p.GPIO13.degrade(),
            p.GPIO2.degrade(),
        ];
        let [p0, p1, p2, p3, p4, p5, p6, p7] = motor_pins;
        let mut pwm_channels: [Channel<'static, LowSpeed>; 8] = [
            ledc.channel(Number::Channel0, p0),
            ledc.channel(Number::Channel1, p1),
            ledc.channel(Number::Channel2, p2),
            ledc.channel(Number::Channel3, p3),
            ledc.channel(Number::Channel4, p4),
            ledc.channel(Number::Channel5, p5),
            ledc.channel(Number::Channel6, p6),
            ledc.channel(Number::Channel7, p7),
        ];
        for pwm in pwm_channels.iter_mut() {
            pwm.configure(channel::config::Config {
                timer: ledc_timer,
                duty_pct: 0,
                pin_config: channel::config::PinConfig::PushPull,
            })
            .expect("Fail configuring ledc channel");
        }
        let [wl_fwd, wl_rev, wr_fwd, wr_rev, z_fwd, z_rev, y_up, y_down] = pwm_channels;

        let clock = EspClock;
        let drive = Drive::new(
            HBridge::new(wl_fwd, wl_rev),
            HBridge::new(wr_fwd, wr_rev),
            clock,
        );
        let motor_z = MotorZ::new(HBridge::new(z_fwd, z_rev), Encoder::new(&Z_PULSES), clock);
        let motor_y = MotorY::new(HBridge::new(y_up, y_down), clock);

        let output = OutputConfig::default();
        let sensors = UltrasonicArray::new(
            (
                Output::new(p.GPIO12, Level::Low, output),
                Input::new(p.GPIO5, InputConfig::default()),
            ),
            (
                Output::new(p.GPIO18, Level::Low, output),
                Input::new(p.GPIO19, InputConfig::default()),
            ),
            (
                Output::new(p.GPIO25, Level::Low, output),
                Input::new(p.GPIO23, InputConfig::default()),
            ),
            clock,
        );
        let avoidance = ObstacleAvoidance::new(clock);
        let pump = Pump::new(Output::new(p.GPIO4, Level::Low, output), clock);
        let buzzer = Buzzer::new(Output::new(p.GPIO14, Level::Low, output), clock);

        let mut storage = MemoryStore::new();
        let pins = PinConfig::load(&mut storage);
        info!("Pin map v{}: wheels {:?}/{:?}", pins.version, pins.wheel_left, pins.wheel_right);

        let dispatcher = Dispatcher::new(
            drive, motor_z, motor_y, sensors, avoidance, pump, buzzer, storage,
        );

        let line_channel = mk_static!(
            SyncChannel<CriticalSectionRawMutex, CommandLine, LINE_CHANNEL_SIZE>,
            SyncChannel::new()
        );

        info!("AgriBot ready to receive commands");
        spawner
            .spawn(serial_task(uart_rx, line_channel.sender()))
            .expect("Fail spawning serial task");
        spawner
            .spawn(control_task(dispatcher, line_channel.receiver(), uart_tx))
            .expect("Fail spawning control task");

        loop {
            pending::<()>().await;
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
