use rand::rngs::StdRng;
use rand::SeedableRng;

use pedigree_graph::{
    extract_pedigrees, meiotic_distance, populate_all, simulate, FatherSelection, FounderHaplotype,
    Generations, LadderBoundedModel, NeverCancel, SimulationParameters,
};

// Simulate 10 generations of 500 males with Gamma-distributed
// fecundity, then pass a 5-locus Y haplotype down every pedigree.
fn main() -> pedigree_graph::Result<()> {
    let mut rng = StdRng::seed_from_u64(101);
    let parameters = SimulationParameters::new(500, Generations::Fixed(10))
        .with_father_selection(FatherSelection::Gamma {
            shape: 5.0,
            scale: 0.2,
        });
    let mut population = simulate(&parameters, &mut rng, &NeverCancel)?.into_population();
    let pedigrees = extract_pedigrees(&mut population)?;

    let model = LadderBoundedModel::new(vec![0.003; 5], vec![8; 5], vec![30; 5])?
        .with_founder(FounderHaplotype::Fixed(vec![14, 12, 20, 17, 11]))?;
    populate_all(&mut population, &pedigrees, &model, &mut rng, &NeverCancel)?;

    let largest = pedigrees
        .iter()
        .max_by_key(|p| p.size())
        .expect("a population has at least one pedigree");
    println!(
        "{} individuals in {} pedigrees; largest has {} members",
        population.len(),
        pedigrees.len(),
        largest.size()
    );

    let present = largest
        .members()
        .iter()
        .copied()
        .filter(|&m| population.individual(m).map_or(false, |i| i.generation() == 0))
        .take(5)
        .collect::<Vec<_>>();
    for (i, &a) in present.iter().enumerate() {
        for &b in &present[i + 1..] {
            let d = meiotic_distance(&population, a, b)?;
            let ha = population.individual(a)?.haplotype();
            let hb = population.individual(b)?.haplotype();
            println!("{a:?} {b:?}: {d:?} meioses, {ha:?} vs {hb:?}");
        }
    }
    Ok(())
}
