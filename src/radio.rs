/*!

Radio Model (spec.md §4.3, component C3): RSL, SNR, per-link MCS classification,
and the pairwise interference contribution used by the ILP's SINR constraints.
Antenna/scan pattern lookups and the MCS table are supplemented per SPEC_FULL.md
§B with simple ordered-table interpolation/thresholding.

*/

use crate::matrix::Matrix;
use crate::error::DataError;

///One row of a device's MCS table: the modulation/coding class, the SNR
///threshold above which it becomes achievable, the throughput it delivers, and
///the transmit power back-off it requires (spec.md §6 Inputs).
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct McsRow
{
	pub mcs_class: u32,
	pub snr_threshold_db: f64,
	pub throughput_mbps: f64,
	pub tx_backoff_db: f64,
}

///An angle -> dB loss table (antenna pattern, boresight-relative, or scan
///pattern, scan-angle-relative). Rows are sorted by angle; lookups between rows
///use linear interpolation, matching how the teacher's adjacency/pattern tables
///are treated as piecewise-linear data throughout this codebase's neighborhood.
#[derive(Debug,Clone)]
pub struct AngleLossTable
{
	rows: Vec<(f64,f64)>,
}

impl AngleLossTable
{
	///Fails if any row's angle is NaN. Device/sector data is an external-boundary
	///input this crate does not parse itself; callers constructing a table from
	///parsed SKU data must propagate this instead of assuming it is clean.
	pub fn new(mut rows:Vec<(f64,f64)>) -> Result<AngleLossTable,DataError>
	{
		let mut err = None;
		rows.sort_by(|a,b| match a.0.partial_cmp(&b.0)
		{
			Some(ordering) => ordering,
			None => { err = Some(DataError::MalformedAngleTable); std::cmp::Ordering::Equal },
		});
		match err
		{
			Some(e) => Err(e),
			None => Ok(AngleLossTable{ rows }),
		}
	}

	///Loss in dB at `angle_deg`, clamped to the table's domain at the ends and
	///linearly interpolated in between.
	pub fn loss_db(&self,angle_deg:f64) -> f64
	{
		if self.rows.is_empty()
		{
			return 0.0;
		}
		if angle_deg <= self.rows[0].0
		{
			return self.rows[0].1;
		}
		if angle_deg >= self.rows[self.rows.len()-1].0
		{
			return self.rows[self.rows.len()-1].1;
		}
		for window in self.rows.windows(2)
		{
			let (a_angle,a_loss) = window[0];
			let (b_angle,b_loss) = window[1];
			if angle_deg >= a_angle && angle_deg <= b_angle
			{
				if (b_angle-a_angle).abs() < f64::EPSILON
				{
					return a_loss;
				}
				let t = (angle_deg-a_angle)/(b_angle-a_angle);
				return a_loss + t*(b_loss-a_loss);
			}
		}
		0.0
	}
}

///Per-device radio parameters needed to compute RSL between two endpoints
///(spec.md §3 "Device", §6 "per-device radio parameters").
#[derive(Debug,Clone)]
pub struct RadioProfile
{
	pub tx_power_dbm: f64,
	pub tx_loss_db: f64,
	pub rx_loss_db: f64,
	pub boresight_gain_dbi: f64,
	pub antenna_pattern: AngleLossTable,
	pub noise_figure_db: f64,
	pub mcs_table: Vec<McsRow>,
}

impl RadioProfile
{
	///Antenna gain toward a direction `deviation_deg` off boresight.
	pub fn gain_toward(&self, deviation_deg:f64) -> f64
	{
		self.boresight_gain_dbi - self.antenna_pattern.loss_db(deviation_deg.abs())
	}

	///Highest-throughput MCS row whose SNR threshold is at or below `snr_db`.
	///Ties at exactly the threshold favor the higher-throughput class, per
	///spec.md §9's tie-break convention.
	pub fn mcs_for_snr(&self, snr_db:f64) -> Option<McsRow>
	{
		self.mcs_table.iter()
			.filter(|row|row.snr_threshold_db <= snr_db)
			.max_by(|a,b|a.mcs_class.cmp(&b.mcs_class))
			.copied()
	}
}

///Free-space path loss in dB for `distance_km` at `frequency_ghz`.
pub fn free_space_path_loss_db(distance_km:f64, frequency_ghz:f64) -> f64
{
	if distance_km <= 0.0
	{
		return 0.0;
	}
	//FSPL(dB) = 20log10(d_km) + 20log10(f_GHz) + 92.45
	20.0*distance_km.log10() + 20.0*frequency_ghz.log10() + 92.45
}

///Gaseous absorption loss (GAL) in dB, a coarse 60 GHz-band model scaling
///linearly with distance at a fixed attenuation rate; `attenuation_db_per_km`
///is carried in configuration since it depends on atmospheric conditions.
pub fn gaseous_absorption_loss_db(distance_km:f64, attenuation_db_per_km:f64) -> f64
{
	distance_km*attenuation_db_per_km
}

///Rain attenuation in dB for a given rain rate (mm/h) and link length, via the
///ITU-R-style specific-attenuation-times-distance approximation; `specific_attenuation_db_per_km`
///is expected to already fold in the frequency- and rain-rate-dependent k/alpha
///coefficients (external, radio-physics derivation, per spec.md §1).
pub fn rain_loss_db(distance_km:f64, specific_attenuation_db_per_km:f64) -> f64
{
	distance_km*specific_attenuation_db_per_km
}

///Aggregate non-antenna propagation losses between two sites.
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct PropagationLosses
{
	pub fspl_db: f64,
	pub gal_db: f64,
	pub rain_db: f64,
}

impl PropagationLosses
{
	pub fn total_db(&self) -> f64
	{
		self.fspl_db + self.gal_db + self.rain_db
	}
}

///RSL and downstream SNR/MCS for an ordered pair (spec.md §4.3).
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct LinkRadioResult
{
	pub rsl_dbm: f64,
	pub snr_db: f64,
	pub mcs: Option<McsRow>,
}

///Computes the received signal level and SNR for a transmitter-receiver pair,
///then classifies the achievable MCS (spec.md §4.3):
///`RSL = P_tx - L_tx + G_tx(dev_tx) - (FSPL+GAL+rain) + G_rx(dev_rx) - L_rx`.
pub fn evaluate_link(
	tx:&RadioProfile, tx_deviation_deg:f64,
	rx:&RadioProfile, rx_deviation_deg:f64,
	losses:PropagationLosses,
	thermal_noise_power_dbm:f64,
) -> LinkRadioResult
{
	let rsl_dbm = tx.tx_power_dbm - tx.tx_loss_db + tx.gain_toward(tx_deviation_deg)
		- losses.total_db()
		+ rx.gain_toward(rx_deviation_deg) - rx.rx_loss_db;
	let snr_db = rsl_dbm - thermal_noise_power_dbm - rx.noise_figure_db;
	let mcs = rx.mcs_for_snr(snr_db);
	LinkRadioResult{ rsl_dbm, snr_db, mcs }
}

///Pairwise interference contribution (spec.md §4.3): the worst-case received
///power (mW, at max Tx) that an active link `(k,l)` would inject at the
///receiving sector of a *different* link `(i,j)`, when the geometric
///co-sighting conditions hold. The caller is responsible for checking those
///conditions (LOS from `k` to `j`, matching receive sector, matching transmit
///sector on `k`) before calling this; this function only converts an RSL-style
///computation to linear mW for accumulation into the interference matrix.
pub fn interference_mw(
	interferer:&RadioProfile, interferer_deviation_deg:f64,
	victim_rx:&RadioProfile, victim_rx_deviation_deg:f64,
	losses:PropagationLosses,
) -> f64
{
	let received_dbm = interferer.tx_power_dbm - interferer.tx_loss_db
		+ interferer.gain_toward(interferer_deviation_deg)
		- losses.total_db()
		+ victim_rx.gain_toward(victim_rx_deviation_deg) - victim_rx.rx_loss_db;
	dbm_to_mw(received_dbm)
}

pub fn dbm_to_mw(dbm:f64) -> f64
{
	10f64.powf(dbm/10.0)
}

pub fn mw_to_dbm(mw:f64) -> f64
{
	if mw <= 0.0
	{
		f64::NEG_INFINITY
	}
	else
	{
		10.0*mw.log10()
	}
}

///Dense interference matrix over the candidate link set: `matrix[k][i]` mW of
///interference link `k` (by index into the same link list) would contribute to
///link `i`'s receiver, pre-computed once per spec.md §4.3 and reused by every
///MILP phase that needs SINR constraints.
pub fn build_interference_matrix(num_links:usize) -> Matrix<f64>
{
	Matrix::constant(0.0,num_links,num_links)
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn flat_pattern() -> AngleLossTable
	{
		AngleLossTable::new(vec![(0.0,0.0),(10.0,3.0),(90.0,30.0)]).expect("literal fixture is well formed")
	}

	#[test]
	fn pattern_interpolates_between_rows()
	{
		let t = flat_pattern();
		assert!((t.loss_db(5.0)-1.5).abs() < 1e-9);
	}

	#[test]
	fn pattern_clamps_outside_domain()
	{
		let t = flat_pattern();
		assert_eq!(t.loss_db(200.0), 30.0);
		assert_eq!(t.loss_db(-5.0), 0.0);
	}

	fn profile() -> RadioProfile
	{
		RadioProfile{
			tx_power_dbm: 20.0,
			tx_loss_db: 1.0,
			rx_loss_db: 1.0,
			boresight_gain_dbi: 30.0,
			antenna_pattern: flat_pattern(),
			noise_figure_db: 6.0,
			mcs_table: vec![
				McsRow{ mcs_class:0, snr_threshold_db:-100.0, throughput_mbps:0.0, tx_backoff_db:0.0 },
				McsRow{ mcs_class:1, snr_threshold_db:5.0, throughput_mbps:500.0, tx_backoff_db:0.0 },
				McsRow{ mcs_class:2, snr_threshold_db:15.0, throughput_mbps:1800.0, tx_backoff_db:3.0 },
			],
		}
	}

	#[test]
	fn mcs_selects_highest_row_at_or_below_snr()
	{
		let p = profile();
		assert_eq!(p.mcs_for_snr(20.0).unwrap().mcs_class, 2);
		assert_eq!(p.mcs_for_snr(10.0).unwrap().mcs_class, 1);
		assert_eq!(p.mcs_for_snr(-200.0).unwrap().mcs_class, 0);
	}

	#[test]
	fn mcs_tie_at_threshold_admits_higher_class()
	{
		let p = profile();
		assert_eq!(p.mcs_for_snr(15.0).unwrap().mcs_class, 2);
	}

	#[test]
	fn evaluate_link_is_reasonable_over_short_range()
	{
		let tx = profile();
		let rx = profile();
		let losses = PropagationLosses{
			fspl_db: free_space_path_loss_db(0.1,60.0),
			gal_db: gaseous_absorption_loss_db(0.1,15.0),
			rain_db: 0.0,
		};
		let result = evaluate_link(&tx,0.0,&rx,0.0,losses,-75.0);
		assert!(result.snr_db > 0.0);
		assert!(result.mcs.is_some());
	}
}
