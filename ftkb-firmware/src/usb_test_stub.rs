extern crate std;
use core::cell::Cell;
use core::cmp::min;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, channel::Channel};
use embassy_usb::driver::{
    Endpoint, EndpointAddress, EndpointError, EndpointIn, EndpointInfo, EndpointOut, EndpointType,
};
use std::rc::Rc;
use std::vec::Vec;

pub const MAX_PACKET_SIZE: u16 = 64;

fn interrupt_info(addr: u8) -> EndpointInfo {
    EndpointInfo {
        addr: EndpointAddress::from(addr),
        ep_type: EndpointType::Interrupt,
        max_packet_size: MAX_PACKET_SIZE,
        interval_ms: 1,
    }
}

#[derive(Clone)]
pub struct MessageChannel(Rc<Channel<NoopRawMutex, Vec<u8>, 10>>);
impl MessageChannel {
    pub async fn send(&self, msg: Vec<u8>) {
        self.0.send(msg).await;
    }

    pub fn get(&self) -> Vec<u8> {
        self.0.try_receive().unwrap()
    }

    pub fn try_get(&self) -> Option<Vec<u8>> {
        self.0.try_receive().ok()
    }

    pub async fn receive(&self) -> Vec<u8> {
        self.0.receive().await
    }
}

impl Default for MessageChannel {
    fn default() -> Self {
        Self(Rc::new(Channel::new()))
    }
}

pub struct MyEndpointIn {
    pub messages: MessageChannel,
    pub info: EndpointInfo,
    /// While set, every write fails as if the host had gone away.
    pub disabled: Rc<Cell<bool>>,
}
impl Endpoint for MyEndpointIn {
    fn info(&self) -> &EndpointInfo {
        &self.info
    }

    async fn wait_enabled(&mut self) {}
}
impl EndpointIn for MyEndpointIn {
    async fn write(&mut self, buf: &[u8]) -> Result<(), EndpointError> {
        if self.disabled.get() {
            return Err(EndpointError::Disabled);
        }
        self.messages.send(Vec::from(buf)).await;
        Ok(())
    }
}
impl Default for MyEndpointIn {
    fn default() -> Self {
        Self {
            messages: MessageChannel::default(),
            info: interrupt_info(0x81),
            disabled: Rc::new(Cell::new(false)),
        }
    }
}

pub struct MyEndpointOut {
    pub messages: MessageChannel,
    pub info: EndpointInfo,
}
impl Endpoint for MyEndpointOut {
    fn info(&self) -> &EndpointInfo {
        &self.info
    }

    async fn wait_enabled(&mut self) {}
}
impl EndpointOut for MyEndpointOut {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, EndpointError> {
        let msg = self.messages.receive().await;
        let msg = &msg[..min(buf.len(), msg.len())];
        buf[..msg.len()].copy_from_slice(msg);
        Ok(msg.len())
    }
}
impl Default for MyEndpointOut {
    fn default() -> Self {
        Self {
            messages: MessageChannel::default(),
            info: interrupt_info(0x01),
        }
    }
}
