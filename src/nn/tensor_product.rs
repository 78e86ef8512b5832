//! Equivariant bilinear maps between irreps-typed features.
//!
//! Both products couple a block of `in1` with a block of `in2` into a block
//! of the output through the real [`wigner_3j`] tensor of the three degrees.
//! Paths are only created when the output irrep is in `ir1 × ir2`, so every
//! map is equivariant by construction.

use std::sync::Arc;

use ndarray::{Array2, Array3, ArrayView2};
use rand::Rng;

use super::error::Error;
use super::init::normal_vec;
use crate::o3::{Irreps, wigner_3j};

/// `out[c] += scale * Σ_ab C[a,b,c] x[a] y[b]`
fn couple(c: &Array3<f64>, x: &[f64], y: &[f64], scale: f64, out: &mut [f64]) {
    for ((a, b, k), coeff) in c.indexed_iter() {
        if *coeff != 0.0 {
            out[k] += scale * coeff * x[a] * y[b];
        }
    }
}

#[derive(Debug, Clone)]
struct Path {
    in1: usize,
    in2: usize,
    out: usize,
    weight_offset: usize,
    scale: f64,
    cg: Arc<Array3<f64>>,
}

/// Every admissible `(in1 block, in2 block) -> out block` path with its own
/// `[mul1, mul2, mul_out]` weight tensor.
#[derive(Debug, Clone)]
pub struct FullyConnectedTensorProduct {
    irreps_in1: Irreps,
    irreps_in2: Irreps,
    irreps_out: Irreps,
    paths: Vec<Path>,
    weights: Vec<f64>,
}

impl FullyConnectedTensorProduct {
    pub fn new(irreps_in1: &Irreps, irreps_in2: &Irreps, irreps_out: &Irreps, rng: &mut impl Rng) -> Self {
        let mut paths = Vec::new();
        let mut numel = 0;
        for (i1, b1) in irreps_in1.iter().enumerate() {
            for (i2, b2) in irreps_in2.iter().enumerate() {
                for (k, bo) in irreps_out.iter().enumerate() {
                    if b1.mul == 0 || b2.mul == 0 || bo.mul == 0 || !(b1.ir * b2.ir).contains(bo.ir) {
                        continue;
                    }
                    paths.push(Path {
                        in1: i1,
                        in2: i2,
                        out: k,
                        weight_offset: numel,
                        scale: 0.0,
                        cg: wigner_3j(b1.ir.l, b2.ir.l, bo.ir.l),
                    });
                    numel += (b1.mul * b2.mul * bo.mul) as usize;
                }
            }
        }

        let mut fan_in = vec![0usize; irreps_out.len()];
        for path in &paths {
            fan_in[path.out] += (irreps_in1.blocks()[path.in1].mul * irreps_in2.blocks()[path.in2].mul) as usize;
        }
        for path in &mut paths {
            let dim_out = irreps_out.blocks()[path.out].ir.dim() as f64;
            path.scale = (dim_out / fan_in[path.out] as f64).sqrt();
        }

        Self {
            irreps_in1: irreps_in1.clone(),
            irreps_in2: irreps_in2.clone(),
            irreps_out: irreps_out.clone(),
            paths,
            weights: normal_vec(rng, numel),
        }
    }

    pub fn irreps_in1(&self) -> &Irreps {
        &self.irreps_in1
    }

    pub fn irreps_in2(&self) -> &Irreps {
        &self.irreps_in2
    }

    pub fn irreps_out(&self) -> &Irreps {
        &self.irreps_out
    }

    pub fn weight_numel(&self) -> usize {
        self.weights.len()
    }

    /// One flag per output column: `true` if some path writes to it.
    pub fn output_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.irreps_out.dim()];
        let slices = self.irreps_out.slices();
        for path in &self.paths {
            for col in slices[path.out].clone() {
                mask[col] = true;
            }
        }
        mask
    }

    pub fn forward(&self, x1: ArrayView2<f64>, x2: ArrayView2<f64>) -> Result<Array2<f64>, Error> {
        Error::check_dim("tensor product input 1", self.irreps_in1.dim(), x1.ncols())?;
        Error::check_dim("tensor product input 2", self.irreps_in2.dim(), x2.ncols())?;
        Error::check_dim("tensor product rows", x1.nrows(), x2.nrows())?;

        let s1 = self.irreps_in1.slices();
        let s2 = self.irreps_in2.slices();
        let so = self.irreps_out.slices();
        let mut out = Array2::zeros((x1.nrows(), self.irreps_out.dim()));

        for (row, (r1, r2)) in x1.rows().into_iter().zip(x2.rows()).enumerate() {
            let r1 = r1.to_vec();
            let r2 = r2.to_vec();
            let mut acc = vec![0.0; self.irreps_out.dim()];

            for path in &self.paths {
                let b1 = self.irreps_in1.blocks()[path.in1];
                let b2 = self.irreps_in2.blocks()[path.in2];
                let bo = self.irreps_out.blocks()[path.out];
                let (d1, d2, dout) = (b1.ir.dim(), b2.ir.dim(), bo.ir.dim());
                let (m1, m2, mo) = (b1.mul as usize, b2.mul as usize, bo.mul as usize);

                let mut coupled = vec![0.0; dout];
                for u in 0..m1 {
                    let x = &r1[s1[path.in1].start + u * d1..][..d1];
                    for v in 0..m2 {
                        let y = &r2[s2[path.in2].start + v * d2..][..d2];
                        coupled.iter_mut().for_each(|c| *c = 0.0);
                        couple(&path.cg, x, y, path.scale, &mut coupled);

                        let w_base = path.weight_offset + (u * m2 + v) * mo;
                        for w in 0..mo {
                            let weight = self.weights[w_base + w];
                            let dst = so[path.out].start + w * dout;
                            for (k, value) in coupled.iter().enumerate() {
                                acc[dst + k] += weight * value;
                            }
                        }
                    }
                }
            }

            for (col, value) in acc.into_iter().enumerate() {
                out[[row, col]] = value;
            }
        }

        Ok(out)
    }
}

/// One `uvu` instruction: block `in1` of multiplicity `u` coupled with every
/// copy `v` of block `in2` into block `out` (multiplicity `u`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub in1: usize,
    pub in2: usize,
    pub out: usize,
}

/// Tensor product whose weights are supplied per sample (per edge).
///
/// Sample weights are laid out instruction by instruction, each as a
/// row-major `[mul1, mul2]` block.
#[derive(Debug, Clone)]
pub struct TensorProduct {
    irreps_in1: Irreps,
    irreps_in2: Irreps,
    irreps_out: Irreps,
    instructions: Vec<Instruction>,
    offsets: Vec<usize>,
    scales: Vec<f64>,
    cgs: Vec<Arc<Array3<f64>>>,
    weight_numel: usize,
}

impl TensorProduct {
    /// # Errors
    ///
    /// Returns [`InvalidConfig`](Error::InvalidConfig) if an instruction
    /// refers to a missing block, couples to an irrep outside `ir1 × ir2`,
    /// or targets a block whose multiplicity differs from `in1`'s.
    pub fn new(
        irreps_in1: &Irreps,
        irreps_in2: &Irreps,
        irreps_out: &Irreps,
        instructions: Vec<Instruction>,
    ) -> Result<Self, Error> {
        let mut offsets = Vec::with_capacity(instructions.len());
        let mut cgs = Vec::with_capacity(instructions.len());
        let mut numel = 0;
        let mut fan_in = vec![0usize; irreps_out.len()];

        for ins in &instructions {
            let (Some(b1), Some(b2), Some(bo)) = (
                irreps_in1.blocks().get(ins.in1),
                irreps_in2.blocks().get(ins.in2),
                irreps_out.blocks().get(ins.out),
            ) else {
                return Err(Error::invalid_config(format!("instruction {ins:?} is out of range")));
            };
            if !(b1.ir * b2.ir).contains(bo.ir) {
                return Err(Error::invalid_config(format!(
                    "{} x {} cannot produce {}",
                    b1.ir, b2.ir, bo.ir
                )));
            }
            if b1.mul != bo.mul {
                return Err(Error::invalid_config(format!(
                    "uvu instruction needs matching multiplicities, got {b1} -> {bo}"
                )));
            }
            offsets.push(numel);
            numel += (b1.mul * b2.mul) as usize;
            fan_in[ins.out] += b2.mul as usize;
            cgs.push(wigner_3j(b1.ir.l, b2.ir.l, bo.ir.l));
        }

        let scales = instructions
            .iter()
            .map(|ins| {
                let dim_out = irreps_out.blocks()[ins.out].ir.dim() as f64;
                (dim_out / fan_in[ins.out].max(1) as f64).sqrt()
            })
            .collect();

        Ok(Self {
            irreps_in1: irreps_in1.clone(),
            irreps_in2: irreps_in2.clone(),
            irreps_out: irreps_out.clone(),
            instructions,
            offsets,
            scales,
            cgs,
            weight_numel: numel,
        })
    }

    pub fn irreps_out(&self) -> &Irreps {
        &self.irreps_out
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn weight_numel(&self) -> usize {
        self.weight_numel
    }

    pub fn forward(
        &self,
        x1: ArrayView2<f64>,
        x2: ArrayView2<f64>,
        weights: ArrayView2<f64>,
    ) -> Result<Array2<f64>, Error> {
        Error::check_dim("tensor product input 1", self.irreps_in1.dim(), x1.ncols())?;
        Error::check_dim("tensor product input 2", self.irreps_in2.dim(), x2.ncols())?;
        Error::check_dim("tensor product weights", self.weight_numel, weights.ncols())?;
        Error::check_dim("tensor product rows", x1.nrows(), x2.nrows())?;
        Error::check_dim("tensor product weight rows", x1.nrows(), weights.nrows())?;

        let s1 = self.irreps_in1.slices();
        let s2 = self.irreps_in2.slices();
        let so = self.irreps_out.slices();
        let mut out = Array2::zeros((x1.nrows(), self.irreps_out.dim()));

        for row in 0..x1.nrows() {
            let r1 = x1.row(row).to_vec();
            let r2 = x2.row(row).to_vec();
            let w = weights.row(row);
            let mut acc = vec![0.0; self.irreps_out.dim()];

            for (idx, ins) in self.instructions.iter().enumerate() {
                let b1 = self.irreps_in1.blocks()[ins.in1];
                let b2 = self.irreps_in2.blocks()[ins.in2];
                let bo = self.irreps_out.blocks()[ins.out];
                let (d1, d2, dout) = (b1.ir.dim(), b2.ir.dim(), bo.ir.dim());
                let m2 = b2.mul as usize;

                for u in 0..b1.mul as usize {
                    let x = &r1[s1[ins.in1].start + u * d1..][..d1];
                    let dst = so[ins.out].start + u * dout;
                    for v in 0..m2 {
                        let y = &r2[s2[ins.in2].start + v * d2..][..d2];
                        let weight = w[self.offsets[idx] + u * m2 + v];
                        couple(&self.cgs[idx], x, y, self.scales[idx] * weight, &mut acc[dst..dst + dout]);
                    }
                }
            }

            for (col, value) in acc.into_iter().enumerate() {
                out[[row, col]] = value;
            }
        }

        Ok(out)
    }
}
