//! Binary snapshot of a network's weights.
//!
//! Layout, all little-endian:
//! `b"SNET"`, `[version: u32]`, `[iteration: u64]`, `[loss: f64]`,
//! `[num_layers: u64]`, then per layer `[rows: u64][cols: u64]`,
//! `rows·cols` weight `f64`s row-major and `rows` bias `f64`s.

use std::fs;
use std::path::Path;

use softnet_core::{Tensor1D, Tensor2D};

use crate::api::error::{NnError, NnResult};
use crate::core::nn::network::Network;

const MAGIC: &[u8; 4] = b"SNET";
const VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct SavedLayer {
    pub weights: Tensor2D,
    pub bias: Tensor1D,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub layers: Vec<SavedLayer>,
    pub iteration: usize,
    pub loss: f64,
}

impl Checkpoint {
    pub fn from_network(network: &Network, iteration: usize, loss: f64) -> Self {
        let layers = network
            .layers()
            .iter()
            .map(|l| SavedLayer {
                weights: l.weights().clone(),
                bias: l.bias().clone(),
            })
            .collect();
        Checkpoint {
            layers,
            iteration,
            loss,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&VERSION.to_le_bytes());
        buf.extend_from_slice(&(self.iteration as u64).to_le_bytes());
        buf.extend_from_slice(&self.loss.to_le_bytes());
        buf.extend_from_slice(&(self.layers.len() as u64).to_le_bytes());
        for layer in &self.layers {
            buf.extend_from_slice(&(layer.weights.rows() as u64).to_le_bytes());
            buf.extend_from_slice(&(layer.weights.cols() as u64).to_le_bytes());
            for v in layer.weights.as_slice().iter().chain(layer.bias.as_slice()) {
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> NnResult<Self> {
        let mut r = Reader { bytes, pos: 0 };
        if r.take(4)? != MAGIC {
            return Err(NnError::Checkpoint("not a softnet checkpoint".into()));
        }
        let version = u32::from_le_bytes(r.array()?);
        if version != VERSION {
            return Err(NnError::Checkpoint(format!(
                "unsupported checkpoint version {version}"
            )));
        }
        let iteration = r.u64()? as usize;
        let loss = r.f64()?;
        let num_layers = r.u64()? as usize;

        let mut layers = Vec::new();
        for _ in 0..num_layers {
            let rows = r.u64()? as usize;
            let cols = r.u64()? as usize;
            let count = rows.checked_mul(cols).ok_or_else(|| {
                NnError::Checkpoint(format!("layer shape {rows}x{cols} overflows"))
            })?;
            let weights = Tensor2D::from_vec(rows, cols, r.f64s(count)?)?;
            let bias = Tensor1D::from_vec(r.f64s(rows)?);
            layers.push(SavedLayer { weights, bias });
        }
        if r.pos != bytes.len() {
            return Err(NnError::Checkpoint(format!(
                "{} trailing bytes",
                bytes.len() - r.pos
            )));
        }
        Ok(Checkpoint {
            layers,
            iteration,
            loss,
        })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> NnResult<()> {
        fs::write(path.as_ref(), self.to_bytes())?;
        log::debug!(
            "saved checkpoint ({} layers, iteration {}) to {}",
            self.layers.len(),
            self.iteration,
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> NnResult<Self> {
        Self::from_bytes(&fs::read(path)?)
    }

    /// Copy the saved weights into `network`. Layer count and every shape
    /// must match; on mismatch the network is left untouched.
    pub fn load_into_network(&self, network: &mut Network) -> NnResult<()> {
        if network.len() != self.layers.len() {
            return Err(NnError::Checkpoint(format!(
                "checkpoint has {} layers, network has {}",
                self.layers.len(),
                network.len()
            )));
        }
        for (i, (saved, layer)) in self.layers.iter().zip(network.layers()).enumerate() {
            if saved.weights.shape() != layer.weights().shape() {
                return Err(NnError::Checkpoint(format!(
                    "layer {i}: checkpoint shape {} does not match {}",
                    saved.weights.dims(),
                    layer.weights().dims()
                )));
            }
        }
        for (saved, layer) in self.layers.iter().zip(network.layers_mut()) {
            layer.set_parameters(saved.weights.clone(), saved.bias.clone())?;
        }
        Ok(())
    }
}

/// Save `network` to `path`.
pub fn save_checkpoint<P: AsRef<Path>>(
    network: &Network,
    path: P,
    iteration: usize,
    loss: f64,
) -> NnResult<()> {
    Checkpoint::from_network(network, iteration, loss).save(path)
}

/// Load `path` into `network` and return the checkpoint.
pub fn load_checkpoint<P: AsRef<Path>>(network: &mut Network, path: P) -> NnResult<Checkpoint> {
    let checkpoint = Checkpoint::load(path)?;
    checkpoint.load_into_network(network)?;
    Ok(checkpoint)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> NnResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| NnError::Checkpoint(format!("truncated at byte {}", self.pos)))?;
        let bytes = self.bytes;
        let out = &bytes[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> NnResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u64(&mut self) -> NnResult<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn f64(&mut self) -> NnResult<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    fn f64s(&mut self, count: usize) -> NnResult<Vec<f64>> {
        let len = count
            .checked_mul(8)
            .ok_or_else(|| NnError::Checkpoint(format!("{count} values overflow")))?;
        Ok(self
            .take(len)?
            .chunks_exact(8)
            .map(|c| {
                let mut b = [0u8; 8];
                b.copy_from_slice(c);
                f64::from_le_bytes(b)
            })
            .collect())
    }
}
