//! USB CDC serial link to the host.
//!
//! The pad reports as a plain USB serial device; state lines are written
//! whole and immediately, one line per change. There is no host-to-device
//! channel and no acknowledgement.

use rp2040_hal::usb::UsbBus;
use usb_device::class_prelude::UsbBusAllocator;
use usb_device::prelude::*;
use usbd_serial::SerialPort;

use steppad_proto::LineTx;

/// USB identifiers: Raspberry Pi vendor ID with the Pico SDK CDC product ID.
const USB_VID_PID: UsbVidPid = UsbVidPid(0x2e8a, 0x000a);

pub struct UsbSerialLink<'a> {
    device: UsbDevice<'a, UsbBus>,
    serial: SerialPort<'a, UsbBus>,
    tx: LineTx,
}

impl<'a> UsbSerialLink<'a> {
    pub fn new(alloc: &'a UsbBusAllocator<UsbBus>) -> Self {
        let serial = SerialPort::new(alloc);
        let device = UsbDeviceBuilder::new(alloc, USB_VID_PID)
            .strings(&[StringDescriptors::default()
                .manufacturer("steppad")
                .product("steppad dance pad")
                .serial_number("0001")])
            .unwrap()
            .device_class(usbd_serial::USB_CLASS_CDC)
            .build();
        Self {
            device,
            serial,
            tx: LineTx::new(),
        }
    }

    /// Service USB enumeration and control traffic. Must run every loop
    /// iteration; the scan cycle is short enough to keep the bus happy.
    pub fn poll(&mut self) {
        self.device.poll(&mut [&mut self.serial]);

        // Discard anything the host writes; the protocol is one-way
        let mut sink = [0u8; 16];
        let _ = self.serial.read(&mut sink);
    }

    /// Write one complete state line.
    ///
    /// Best effort: if the host is not reading (or nobody has opened the
    /// port yet) the message is dropped rather than retried. [`LineTx`]
    /// keeps a stalled endpoint from corrupting framing — a line cut short
    /// by a full TX buffer is terminated before the next one goes out, so
    /// the host discards the fragment instead of fusing two lines.
    pub fn send(&mut self, msg: &[u8]) {
        let serial = &mut self.serial;
        self.tx.send(msg, |bytes| serial.write(bytes).map_err(|_| ()));
        let _ = serial.flush();
    }
}
