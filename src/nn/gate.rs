//! Gate nonlinearity for mixed scalar / higher-degree features.

use ndarray::{Array2, ArrayView2, s};

use super::activation::{Activation, gate_activation, scalar_activation};
use super::error::Error;
use super::layer::{Layer, MessageContext};
use crate::o3::{Irrep, Irreps, MulIr, Parity};

/// Parity of `act(x)` for a scalar `x` of parity `p`.
fn activated_parity(p: Parity, act: Activation, what: &str) -> Result<Parity, Error> {
    match p {
        Parity::Even => Ok(Parity::Even),
        Parity::Odd if act.is_odd() => Ok(Parity::Odd),
        Parity::Odd => Err(Error::InvalidGate(format!(
            "{what} activation {act} is not odd and cannot act on odd scalars"
        ))),
    }
}

/// Activates scalars directly and scales each higher-degree irrep copy by
/// an activated gate scalar.
///
/// Input columns are laid out as `scalars ⊕ gates ⊕ gated`; output columns
/// as `scalars ⊕ gated`. A gated copy multiplied by an odd gate flips its
/// parity.
#[derive(Debug, Clone)]
pub struct Gate {
    irreps_scalars: Irreps,
    act_scalars: Vec<Activation>,
    irreps_gates: Irreps,
    act_gates: Vec<Activation>,
    irreps_gated: Irreps,
    irreps_in: Irreps,
    irreps_out: Irreps,
}

impl Gate {
    /// `act_scalars` and `act_gates` hold one activation per block of
    /// `scalars` and `gates` respectively.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidGate`](Error::InvalidGate) if `scalars` or `gates`
    /// contain non-scalar irreps, if the number of gate scalars differs from
    /// the number of gated irrep copies, if the activation lists do not
    /// match the blocks, or if an odd scalar meets a non-odd activation.
    pub fn new(
        irreps_scalars: &Irreps,
        act_scalars: Vec<Activation>,
        irreps_gates: &Irreps,
        act_gates: Vec<Activation>,
        irreps_gated: &Irreps,
    ) -> Result<Self, Error> {
        if !irreps_scalars.is_scalar() {
            return Err(Error::InvalidGate(format!(
                "scalars {irreps_scalars} must contain only degree-0 irreps"
            )));
        }
        if !irreps_gates.is_scalar() {
            return Err(Error::InvalidGate(format!(
                "gates {irreps_gates} must contain only degree-0 irreps"
            )));
        }
        if irreps_gates.num_irreps() != irreps_gated.num_irreps() {
            return Err(Error::InvalidGate(format!(
                "{} gates for {} gated irreps ({irreps_gated})",
                irreps_gates.num_irreps(),
                irreps_gated.num_irreps()
            )));
        }
        if act_scalars.len() != irreps_scalars.len() || act_gates.len() != irreps_gates.len() {
            return Err(Error::InvalidGate(format!(
                "expected {} scalar and {} gate activations, got {} and {}",
                irreps_scalars.len(),
                irreps_gates.len(),
                act_scalars.len(),
                act_gates.len()
            )));
        }

        let mut scalars_out = Vec::with_capacity(irreps_scalars.len());
        for (block, &act) in irreps_scalars.iter().zip(&act_scalars) {
            let p = activated_parity(block.ir.p, act, "scalar")?;
            scalars_out.push(MulIr::new(block.mul, Irrep::new(0, p)));
        }
        let mut gate_parities = Vec::with_capacity(irreps_gated.num_irreps());
        for (block, &act) in irreps_gates.iter().zip(&act_gates) {
            let p = activated_parity(block.ir.p, act, "gate")?;
            gate_parities.extend(std::iter::repeat_n(p, block.mul as usize));
        }

        // Gates covering one gated block must share a parity.
        let mut gated_out = Vec::with_capacity(irreps_gated.len());
        let mut copy = 0;
        for block in irreps_gated {
            let p = gate_parities.get(copy).copied().unwrap_or(Parity::Even);
            if gate_parities[copy..copy + block.mul as usize].iter().any(|&g| g != p) {
                return Err(Error::InvalidGate(format!(
                    "gates for block {block} of {irreps_gated} mix parities"
                )));
            }
            gated_out.push(MulIr::new(block.mul, Irrep::new(block.ir.l, block.ir.p * p)));
            copy += block.mul as usize;
        }

        let irreps_in = irreps_scalars + irreps_gates;
        let irreps_in = &irreps_in + irreps_gated;
        let irreps_out = Irreps::new(scalars_out) + Irreps::new(gated_out);

        Ok(Self {
            irreps_scalars: irreps_scalars.clone(),
            act_scalars,
            irreps_gates: irreps_gates.clone(),
            act_gates,
            irreps_gated: irreps_gated.clone(),
            irreps_in,
            irreps_out,
        })
    }

    /// Builds a gate whose activations follow the block parities: SiLU or
    /// tanh for scalars, sigmoid or tanh for gates.
    pub fn with_parity_activations(scalars: &Irreps, gates: &Irreps, gated: &Irreps) -> Result<Self, Error> {
        let act_scalars = scalars.iter().map(|b| scalar_activation(b.ir.p)).collect();
        let act_gates = gates.iter().map(|b| gate_activation(b.ir.p)).collect();
        Self::new(scalars, act_scalars, gates, act_gates, gated)
    }

    pub fn irreps_scalars(&self) -> &Irreps {
        &self.irreps_scalars
    }

    pub fn irreps_gates(&self) -> &Irreps {
        &self.irreps_gates
    }

    pub fn irreps_gated(&self) -> &Irreps {
        &self.irreps_gated
    }

    /// Applies the gate to rows laid out as `scalars ⊕ gates ⊕ gated`.
    pub fn apply(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, Error> {
        Error::check_dim("gate input", self.irreps_in.dim(), x.ncols())?;
        let n_scalars = self.irreps_scalars.dim();
        let n_gates = self.irreps_gates.dim();
        let mut out = Array2::zeros((x.nrows(), self.irreps_out.dim()));

        let mut col = 0;
        for (block, act) in self.irreps_scalars.iter().zip(&self.act_scalars) {
            let width = block.dim();
            let act = *act;
            out.slice_mut(s![.., col..col + width])
                .assign(&x.slice(s![.., col..col + width]).mapv(|v| act.apply(v)));
            col += width;
        }

        let mut gates = x.slice(s![.., n_scalars..n_scalars + n_gates]).to_owned();
        let mut gcol = 0;
        for (block, act) in self.irreps_gates.iter().zip(&self.act_gates) {
            let width = block.dim();
            let act = *act;
            gates.slice_mut(s![.., gcol..gcol + width]).mapv_inplace(|v| act.apply(v));
            gcol += width;
        }

        let mut src = n_scalars + n_gates;
        let mut dst = n_scalars;
        let mut copy = 0;
        for block in &self.irreps_gated {
            let d = block.ir.dim();
            for _ in 0..block.mul {
                let gate = gates.column(copy);
                let mut target = out.slice_mut(s![.., dst..dst + d]);
                target.assign(&x.slice(s![.., src..src + d]));
                for (mut row, g) in target.rows_mut().into_iter().zip(gate.iter()) {
                    row *= *g;
                }
                src += d;
                dst += d;
                copy += 1;
            }
        }
        Ok(out)
    }
}

impl Layer for Gate {
    fn irreps_in(&self) -> &Irreps {
        &self.irreps_in
    }

    fn irreps_out(&self) -> &Irreps {
        &self.irreps_out
    }

    fn forward(&self, x: ArrayView2<f64>, _ctx: &MessageContext<'_>) -> Result<Array2<f64>, Error> {
        self.apply(x)
    }
}
