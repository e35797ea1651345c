use core::sync::atomic::{AtomicUsize, Ordering};
use embassy_usb::{
    class::hid::{ReadError, ReportId, RequestHandler},
    driver::{EndpointError, EndpointIn, EndpointOut},
};

use crate::warn;

pub struct HidWriter<E: EndpointIn, const N: usize> {
    ep_in: E,
}

impl<E: EndpointIn, const N: usize> HidWriter<E, N> {
    pub fn new(ep_in: E) -> Self {
        Self { ep_in }
    }

    /// Writes `report` to its interrupt endpoint.
    pub async fn write(&mut self, report: &[u8]) -> Result<(), EndpointError> {
        if report.len() > N {
            return Err(EndpointError::BufferOverflow);
        }

        let max_packet_size = usize::from(self.ep_in.info().max_packet_size);
        let zlp_needed = report.len() < N && report.len() % max_packet_size == 0;
        for chunk in report.chunks(max_packet_size) {
            self.ep_in.write(chunk).await?;
        }

        if zlp_needed {
            self.ep_in.write(&[]).await?;
        }

        Ok(())
    }
}

pub struct HidReader<'d, E: EndpointOut, const N: usize> {
    ep_out: E,
    offset: &'d AtomicUsize,
}

impl<'d, E: EndpointOut, const N: usize> HidReader<'d, E, N> {
    pub fn new(ep_out: E, offset: &'d AtomicUsize) -> Self {
        Self { ep_out, offset }
    }

    /// Delivers output reports from the Interrupt Out pipe to `handler`.
    ///
    /// The first byte of each report is taken as its `ReportId`.
    pub async fn run<T: RequestHandler>(mut self, handler: &mut T) -> ! {
        let mut buf = [0; N];
        loop {
            match self.read(&mut buf).await {
                Ok(len) => {
                    handler.set_report(ReportId::Out(buf[0]), &buf[..len]);
                }
                Err(ReadError::BufferOverflow) => {
                    warn!(
                        "Host sent output report larger than the configured maximum output report length ({})",
                        N
                    );
                }
                Err(ReadError::Disabled) => self.ep_out.wait_enabled().await,
                Err(ReadError::Sync(_)) => {
                    warn!("partial output report discarded");
                }
            }
        }
    }

    /// Reads an output report from the Interrupt Out pipe.
    ///
    /// If this future is dropped part way through a multi-packet report the next call returns
    /// [`ReadError::Sync`] covering the bytes it completed.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        if N == 0 || buf.len() < N {
            return Err(ReadError::BufferOverflow);
        }

        let max_packet_size = usize::from(self.ep_out.info().max_packet_size);
        let starting_offset = self.offset.load(Ordering::Acquire);
        let mut total = starting_offset;
        loop {
            for chunk in buf[starting_offset..N].chunks_mut(max_packet_size) {
                match self.ep_out.read(chunk).await {
                    Ok(size) => {
                        total += size;
                        if size < max_packet_size || total == N {
                            self.offset.store(0, Ordering::Release);
                            break;
                        }
                        self.offset.store(total, Ordering::Release);
                    }
                    Err(err) => {
                        self.offset.store(0, Ordering::Release);
                        return Err(err.into());
                    }
                }
            }

            // Some hosts send ZLPs even when not required, so keep going while nothing arrived.
            if total > 0 {
                break;
            }
        }

        if starting_offset > 0 {
            Err(ReadError::Sync(starting_offset..total))
        } else {
            Ok(total)
        }
    }
}

#[cfg(test)]
#[path = "hid_test.rs"]
mod test;
