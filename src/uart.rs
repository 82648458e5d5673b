//! UART transport for ESP32 using esp-idf-svc

use crate::transport::PlayerTransport;
use esp_idf_svc::hal::gpio::{self, InputPin, OutputPin};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, UartDriver};
use esp_idf_svc::sys::EspError;
use std::time::Duration;

/// Power-up time of the module before it answers on the serial line
const BOOT_DELAY: Duration = Duration::from_millis(1000);

pub struct UartTransport<'a> {
    uart: UartDriver<'a>,
}

impl<'a> UartTransport<'a> {
    /// Drive the player on `uart` at its fixed 9600 baud, 8N1
    pub fn new(
        uart: impl Peripheral<P = impl uart::Uart> + 'a,
        tx: impl Peripheral<P = impl OutputPin> + 'a,
        rx: impl Peripheral<P = impl InputPin> + 'a,
    ) -> Result<Self, EspError> {
        Self::with_baud_rate(uart, tx, rx, 9600)
    }

    /// Same as [`UartTransport::new`] for modules re-flashed to another rate
    pub fn with_baud_rate(
        uart: impl Peripheral<P = impl uart::Uart> + 'a,
        tx: impl Peripheral<P = impl OutputPin> + 'a,
        rx: impl Peripheral<P = impl InputPin> + 'a,
        baud_rate: u32,
    ) -> Result<Self, EspError> {
        let config = uart::config::Config::default()
            .baudrate(baud_rate.into())
            .data_bits(uart::config::DataBits::DataBits8)
            .parity_none()
            .stop_bits(uart::config::StopBits::STOP1);
        let driver = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<gpio::Gpio0>::None,
            Option::<gpio::Gpio0>::None,
            &config,
        )?;

        std::thread::sleep(BOOT_DELAY);
        driver.clear_rx()?;

        Ok(Self { uart: driver })
    }
}

impl PlayerTransport for UartTransport<'_> {
    type Error = EspError;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.uart.write(data)
    }

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        self.uart.read(buf, timeout_ms)
    }

    fn clear_input(&mut self) -> Result<(), Self::Error> {
        self.uart.clear_rx()
    }
}
