use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rolegate_auth::{
    dashboard_modules, has_permission, resolve, set_overrides, PermissionKey, UserOverride,
};
use rolegate_core::{PermissionId, RoleId, UserId};
use rolegate_infra::{NewPermission, NewRole, RbacStores};

/// Catalog with `roles` roles of `per_role` permissions each (spread over
/// ten modules), one user holding every role and a handful of overrides.
fn setup(roles: usize, per_role: usize) -> (RbacStores, UserId) {
    let stores = RbacStores::new();
    let mut role_ids: Vec<RoleId> = Vec::with_capacity(roles);
    let mut all: Vec<PermissionId> = Vec::new();

    for r in 0..roles {
        let mut ids = Vec::with_capacity(per_role);
        for p in 0..per_role {
            let permission = stores
                .catalog
                .create_permission(NewPermission {
                    key: PermissionKey::new(format!("role{r}.perm{p}")),
                    name: format!("Permission {r}/{p}"),
                    description: None,
                    module: Some(format!("Module{}", p % 10)),
                })
                .unwrap();
            ids.push(permission.id);
        }
        all.extend(ids.iter().copied());
        let role = stores
            .catalog
            .create_role(NewRole {
                name: format!("ROLE_{r}"),
                permissions: ids.into_iter().collect(),
                ..NewRole::default()
            })
            .unwrap();
        role_ids.push(role.id);
    }

    let user = stores.create_user("bench", role_ids).unwrap();
    let overrides: Vec<UserOverride> = all
        .iter()
        .step_by(7)
        .enumerate()
        .map(|(i, id)| {
            if i % 2 == 0 {
                UserOverride::deny(*id)
            } else {
                UserOverride::grant(*id)
            }
        })
        .collect();
    set_overrides(&stores.context(), user, &overrides).unwrap();

    (stores, user)
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for &(roles, per_role) in &[(2usize, 10usize), (10, 20), (40, 25)] {
        let (stores, user) = setup(roles, per_role);
        let ctx = stores.context();
        group.throughput(Throughput::Elements((roles * per_role) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{roles}x{per_role}")),
            &user,
            |b, user| b.iter(|| black_box(resolve(&ctx, *user).unwrap())),
        );
    }
    group.finish();
}

fn bench_gate_and_modules(c: &mut Criterion) {
    let (stores, user) = setup(10, 20);
    let ctx = stores.context();

    c.bench_function("has_permission", |b| {
        b.iter(|| black_box(has_permission(&ctx, user, "role3.perm4").unwrap()))
    });
    c.bench_function("dashboard_modules", |b| {
        b.iter(|| black_box(dashboard_modules(&ctx, user).unwrap()))
    });
}

criterion_group!(benches, bench_resolve, bench_gate_and_modules);
criterion_main!(benches);
